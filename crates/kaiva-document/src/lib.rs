//! Kaiva Document Reader
//!
//! Implements the `TextExtractor` trait for text-bearing PDFs using `lopdf`.
//! Pages are read in page-number order and joined with newlines. Scanned
//! documents without a text layer are rejected rather than sent to the
//! model empty.
//!
//! # Examples
//!
//! ```no_run
//! use kaiva_document::PdfTextExtractor;
//! use kaiva_domain::traits::TextExtractor;
//!
//! let bytes = std::fs::read("lease.pdf").unwrap();
//! let text = PdfTextExtractor::new().extract_text(&bytes).unwrap();
//! println!("{} chars", text.len());
//! ```

#![warn(missing_docs)]

#[cfg(any(test, feature = "testing"))]
pub mod testing;

use kaiva_domain::traits::TextExtractor;
use lopdf::Document;
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading a document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Bytes are not a readable PDF
    #[error("Could not read PDF: {0}")]
    Load(String),

    /// A page's content stream could not be decoded
    #[error("Could not extract text from page {page}: {reason}")]
    Extraction {
        /// One-based page number
        page: u32,
        /// Underlying error
        reason: String,
    },

    /// PDF has no pages
    #[error("PDF contains no pages")]
    NoPages,

    /// PDF has pages but no text layer
    #[error("PDF contains no extractable text (scanned documents are not supported)")]
    NoText,
}

/// PDF text extraction backed by `lopdf`
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Create a new extractor
    pub fn new() -> Self {
        Self
    }

    /// Text of each page, keyed by one-based page number
    pub fn page_texts(&self, bytes: &[u8]) -> Result<Vec<(u32, String)>, DocumentError> {
        let doc = Document::load_mem(bytes).map_err(|e| DocumentError::Load(e.to_string()))?;

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(DocumentError::NoPages);
        }

        let mut texts = Vec::with_capacity(pages.len());
        for page_num in pages.keys().copied() {
            let text = doc
                .extract_text(&[page_num])
                .map_err(|e| DocumentError::Extraction {
                    page: page_num,
                    reason: e.to_string(),
                })?;
            texts.push((page_num, text));
        }

        debug!(pages = texts.len(), "Extracted PDF page text");
        Ok(texts)
    }
}

impl TextExtractor for PdfTextExtractor {
    type Error = DocumentError;

    fn extract_text(&self, bytes: &[u8]) -> Result<String, Self::Error> {
        let pages = self.page_texts(bytes)?;

        let text = pages
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(DocumentError::NoText);
        }

        Ok(text)
    }
}
