//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction pipeline and
//! infrastructure. Implementations live in other crates.

use crate::ExtractionResult;
use async_trait::async_trait;
use std::path::PathBuf;

/// Trait for text-generation model calls
///
/// Implemented by the infrastructure layer (kaiva-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for model calls
    type Error: std::fmt::Display + Send;

    /// Send a system instruction and user content, return the raw reply text
    ///
    /// Called once per document; implementations must not retry internally.
    async fn generate(&self, system: &str, user: &str) -> Result<String, Self::Error>;
}

/// Trait for turning document bytes into plain text
///
/// Implemented by the infrastructure layer (kaiva-document)
pub trait TextExtractor {
    /// Error type for extraction
    type Error;

    /// Return per-page text concatenated in reading order
    fn extract_text(&self, bytes: &[u8]) -> Result<String, Self::Error>;
}

/// Trait for writing an extraction result as a two-column table
///
/// Implemented by the infrastructure layer (kaiva-store)
pub trait TableExporter {
    /// Error type for export
    type Error;

    /// Write the table and return the path of the produced artifact
    fn export(&self, result: &ExtractionResult) -> Result<PathBuf, Self::Error>;
}
