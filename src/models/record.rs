// file: src/models/record.rs
// description: per-file validation state as seen by renderers and policies
// reference: internal data structures

use crate::config::DisplayLabels;
use crate::models::IntakeFile;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Pending,
    Validating,
    Valid,
    Invalid,
}

impl Lifecycle {
    pub fn is_settled(self) -> bool {
        matches!(self, Lifecycle::Valid | Lifecycle::Invalid)
    }
}

/// What an external validator reports about one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub page_count: u32,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn valid(page_count: u32) -> Self {
        Self {
            is_valid: true,
            page_count,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            page_count: 0,
            error: Some(error.into()),
        }
    }
}

/// Point-in-time copy of one record. Position in the snapshot list is the
/// record's only external identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecordSnapshot {
    pub file: IntakeFile,
    pub lifecycle: Lifecycle,
    pub page_count: u32,
    pub error: Option<String>,
    pub progress: Option<u8>,
}

impl FileRecordSnapshot {
    pub fn name(&self) -> &str {
        self.file.name()
    }

    pub fn is_valid(&self) -> bool {
        self.lifecycle == Lifecycle::Valid
    }

    pub fn is_invalid(&self) -> bool {
        self.lifecycle == Lifecycle::Invalid
    }

    pub fn is_validating(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Pending | Lifecycle::Validating)
    }

    pub fn status_label<'a>(&'a self, labels: &'a DisplayLabels) -> &'a str {
        match self.lifecycle {
            Lifecycle::Pending | Lifecycle::Validating => labels.validating.as_str(),
            Lifecycle::Valid => labels.valid.as_str(),
            Lifecycle::Invalid => self.error.as_deref().unwrap_or(labels.invalid.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileKind;

    fn snapshot(lifecycle: Lifecycle, error: Option<&str>) -> FileRecordSnapshot {
        FileRecordSnapshot {
            file: IntakeFile::new("a.pdf", b"%PDF-".to_vec()),
            lifecycle,
            page_count: 0,
            error: error.map(str::to_string),
            progress: None,
        }
    }

    #[test]
    fn test_lifecycle_settled() {
        assert!(!Lifecycle::Pending.is_settled());
        assert!(!Lifecycle::Validating.is_settled());
        assert!(Lifecycle::Valid.is_settled());
        assert!(Lifecycle::Invalid.is_settled());
    }

    #[test]
    fn test_status_label() {
        let labels = DisplayLabels::for_kind(FileKind::Pdf);

        assert_eq!(
            snapshot(Lifecycle::Validating, None).status_label(&labels),
            labels.validating
        );
        assert_eq!(snapshot(Lifecycle::Valid, None).status_label(&labels), labels.valid);
        assert_eq!(
            snapshot(Lifecycle::Invalid, Some("corrupt")).status_label(&labels),
            "corrupt"
        );
        assert_eq!(
            snapshot(Lifecycle::Invalid, None).status_label(&labels),
            labels.invalid
        );
    }
}
