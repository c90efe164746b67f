// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod file;
pub mod notice;
pub mod record;

pub use file::IntakeFile;
pub use notice::{IntakeNotice, NoticeSeverity};
pub use record::{FileRecordSnapshot, Lifecycle, ValidationResult};
