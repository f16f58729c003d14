//! Artifact directory management

use crate::StoreError;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Content type served for generated abstracts
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const ARTIFACT_PREFIX: &str = "abstract_";
const ARTIFACT_EXTENSION: &str = ".xlsx";

/// Directory-backed store for generated spreadsheets
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open (creating if needed) the artifact directory
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        info!("Artifact directory: {}", root.display());
        Ok(Self { root })
    }

    /// Directory holding the artifacts
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fresh, unique artifact filename and its full path
    pub fn allocate(&self) -> (String, PathBuf) {
        let filename = format!(
            "{}{}{}",
            ARTIFACT_PREFIX,
            Uuid::new_v4().simple(),
            ARTIFACT_EXTENSION
        );
        let path = self.root.join(&filename);
        (filename, path)
    }

    /// Path of an existing artifact
    ///
    /// # Errors
    ///
    /// `InvalidName` for anything that is not a plain `.xlsx` filename
    /// (separators, `..`, other characters), `NotFound` if absent.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, StoreError> {
        validate_filename(filename)?;

        let path = self.root.join(filename);
        if !path.is_file() {
            return Err(StoreError::NotFound(filename.to_string()));
        }
        Ok(path)
    }
}

fn validate_filename(filename: &str) -> Result<(), StoreError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.';

    let stem = filename.strip_suffix(ARTIFACT_EXTENSION).unwrap_or("");
    if stem.is_empty() || filename.contains("..") || !filename.chars().all(allowed) {
        return Err(StoreError::InvalidName(filename.to_string()));
    }
    Ok(())
}
