//! Kaiva Domain Layer
//!
//! Core vocabulary of the lease abstractor: the fixed field schema, the
//! schema-shaped extraction result, and the trait seams for every external
//! collaborator (model call, PDF text extraction, tabular export).
//!
//! ## Key Concepts
//!
//! - **Field Schema**: the ordered set of lease attributes that is always reported
//! - **Sentinel**: `"Not Stated"`, used for any field the model did not return
//! - **Extraction Result**: the complete, schema-ordered field → value mapping
//!
//! ## Architecture
//!
//! - Pure data and trait definitions only
//! - Infrastructure implementations live in other crates
//!   (`kaiva-llm`, `kaiva-document`, `kaiva-store`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod result;
pub mod schema;
pub mod traits;

// Re-exports for convenience
pub use result::{ExtractionResult, NOT_STATED};
pub use schema::{FieldSchema, SchemaError, LEASE_FIELDS};
