// file: src/models/file.rs
// description: opaque in-memory file handle admitted into the intake
// reference: internal data structures

use crate::error::{IntakeError, Result};
use bytes::Bytes;
use std::path::Path;

/// A selected file held in memory for the lifetime of the intake session.
///
/// Cloning is cheap: the content is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeFile {
    name: String,
    data: Bytes,
}

impl IntakeFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| IntakeError::FileOperation {
                path: path.to_path_buf(),
                source,
            })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Ok(Self::new(name, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Lowercased extension without the dot, if the name has one.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}
