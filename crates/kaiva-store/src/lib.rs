//! Kaiva Artifact Storage
//!
//! Owns the directory where generated abstracts live and writes extraction
//! results as two-column `.xlsx` tables.
//!
//! # Architecture
//!
//! - `ArtifactStore`: names, locates and validates artifact files
//! - `XlsxExporter`: implements the `TableExporter` trait from `kaiva-domain`
//!
//! Artifact names carry a random UUID so concurrent requests never write
//! to the same path.
//!
//! # Examples
//!
//! ```no_run
//! use kaiva_store::{ArtifactStore, XlsxExporter};
//!
//! let store = ArtifactStore::open("abstracts").unwrap();
//! let exporter = XlsxExporter::new(store);
//! ```

#![warn(missing_docs)]

pub mod artifacts;
pub mod xlsx;

use thiserror::Error;

pub use artifacts::{ArtifactStore, XLSX_CONTENT_TYPE};
pub use xlsx::XlsxExporter;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact name is not one this store could have produced
    #[error("Invalid artifact name: {0}")]
    InvalidName(String),

    /// Artifact does not exist
    #[error("Artifact not found: {0}")]
    NotFound(String),

    /// Spreadsheet could not be written
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
}
