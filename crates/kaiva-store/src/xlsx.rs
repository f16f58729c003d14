//! Two-column spreadsheet export

use crate::{ArtifactStore, StoreError};
use kaiva_domain::traits::TableExporter;
use kaiva_domain::ExtractionResult;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::PathBuf;
use tracing::debug;

/// Column headers of the exported table
pub const HEADERS: [&str; 2] = ["Field", "Extracted Detail"];

const SHEET_NAME: &str = "Lease Abstract";

/// Excel rejects longer cell strings
const MAX_CELL_CHARS: usize = 32_767;

/// Writes extraction results as `.xlsx` files into an `ArtifactStore`
#[derive(Debug, Clone)]
pub struct XlsxExporter {
    store: ArtifactStore,
}

impl XlsxExporter {
    /// Create an exporter writing into `store`
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    /// Store the exporter writes into
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Build the workbook in memory
    pub fn render(result: &ExtractionResult) -> Result<Vec<u8>, StoreError> {
        build_workbook(result)
            .and_then(|mut workbook| workbook.save_to_buffer())
            .map_err(|e| StoreError::Spreadsheet(e.to_string()))
    }
}

impl TableExporter for XlsxExporter {
    type Error = StoreError;

    fn export(&self, result: &ExtractionResult) -> Result<PathBuf, Self::Error> {
        let bytes = Self::render(result)?;
        let (filename, path) = self.store.allocate();
        std::fs::write(&path, bytes)?;

        debug!(rows = result.len(), file = %filename, "Wrote abstract");
        Ok(path)
    }
}

/// Rows written below the header, in result order
pub fn table_rows(result: &ExtractionResult) -> Vec<[&str; 2]> {
    result.iter().map(|(field, value)| [field, value]).collect()
}

fn build_workbook(result: &ExtractionResult) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let wrap = Format::new().set_text_wrap();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;
    worksheet.set_column_width(0, 45)?;
    worksheet.set_column_width(1, 80)?;

    for (col, title) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (idx, [field, value]) in table_rows(result).into_iter().enumerate() {
        let row = idx as u32 + 1;
        worksheet.write_string(row, 0, field)?;
        worksheet.write_string_with_format(row, 1, clip(value), &wrap)?;
    }

    Ok(workbook)
}

fn clip(value: &str) -> &str {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((byte_idx, _)) => &value[..byte_idx],
        None => value,
    }
}
