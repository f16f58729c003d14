//! Error types for the Extractor

use std::fmt;
use thiserror::Error;

/// Failure taxonomy reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The model call failed or returned an unusable response
    ModelError,
    /// Every parsing strategy failed or yielded a non-mapping
    UnparseableReply,
    /// The supplied bytes could not be read as a document
    UpstreamInputError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::ModelError => "ModelError",
            FailureKind::UnparseableReply => "UnparseableReply",
            FailureKind::UpstreamInputError => "UpstreamInputError",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during extraction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractorError {
    /// Model call failed (network, authentication, quota, malformed API response)
    #[error("Model call failed: {0}")]
    Model(String),

    /// No parsing strategy produced a mapping
    #[error("Could not parse model reply into a mapping: {0}")]
    UnparseableReply(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Taxonomy tag for this error
    ///
    /// Configuration problems surface before any model call, so they are
    /// reported alongside model failures.
    pub fn kind(&self) -> FailureKind {
        match self {
            ExtractorError::Model(_) | ExtractorError::Config(_) => FailureKind::ModelError,
            ExtractorError::UnparseableReply(_) => FailureKind::UnparseableReply,
        }
    }
}
