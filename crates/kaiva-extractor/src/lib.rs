//! Kaiva Extractor
//!
//! Turns raw lease text into a complete, schema-shaped field mapping using a
//! text-generation model.
//!
//! # Architecture
//!
//! ```text
//! Text → PromptBuilder → LLM → Response Parser → Field Completer → ExtractionResult
//! ```
//!
//! # Key Features
//!
//! - **Fixed schema**: every run reports exactly the configured fields, in order
//! - **Dialect-tolerant parsing**: Python literal, strict JSON, and fenced replies
//! - **Sentinel filling**: absent fields are reported as `"Not Stated"`
//! - **Single attempt**: no retries of the model call or the parse chain
//!
//! # Example Usage
//!
//! ```
//! use kaiva_domain::FieldSchema;
//! use kaiva_extractor::{Extractor, ExtractorConfig};
//! use kaiva_llm::MockProvider;
//!
//! # tokio_test::block_on(async {
//! let llm = MockProvider::new("{'Tenant Legal Name': 'Acme Corp'}");
//! let schema = FieldSchema::new(["Tenant Legal Name", "Square Footage"]).unwrap();
//! let extractor = Extractor::new(llm, schema, ExtractorConfig::default()).unwrap();
//!
//! let extraction = extractor.extract("This lease is made with Acme Corp...").await.unwrap();
//! assert_eq!(extraction.result.get("Tenant Legal Name"), Some("Acme Corp"));
//! assert_eq!(extraction.result.get("Square Footage"), Some("Not Stated"));
//! # });
//! ```

#![warn(missing_docs)]

pub mod completer;
pub mod config;
pub mod error;
pub mod extractor;
pub mod literal;
pub mod parser;
pub mod prompt;
pub mod types;


pub use completer::complete;
pub use config::ExtractorConfig;
pub use error::{ExtractorError, FailureKind};
pub use extractor::Extractor;
pub use parser::parse_llm_response;
pub use prompt::{Prompt, PromptBuilder};
pub use types::{Extraction, ExtractionMetadata, ExtractionStage, ReplyMap};
