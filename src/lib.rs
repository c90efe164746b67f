// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod utils;
pub mod validator;

pub use config::{
    AutoAdvanceConfig, Condition, CountRequirement, DisplayLabels, FileKind, IntakeConfiguration,
    ProgressConfig,
};
pub use error::{IntakeError, Result};
pub use models::{
    FileRecordSnapshot, IntakeFile, IntakeNotice, Lifecycle, NoticeSeverity, ValidationResult,
};
pub use pipeline::{
    AdmissionOutcome, ContinuationBatch, GateBlock, GateVerdict, IntakeOrchestrator,
    IntakeSnapshot, ProgressSimulator, can_continue,
};
pub use report::{IntakeProgressView, IntakeSummary};
pub use source::FileScanner;
pub use validator::{FileValidator, SignatureValidator};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_library_exports() {
        let config = IntakeConfiguration::default_config();
        let validator = Arc::new(SignatureValidator::new(config.file_kind));
        let intake = IntakeOrchestrator::new(config, validator, |_| {}).unwrap();
        assert!(intake.is_empty());
        assert!(!intake.verdict().allowed);
    }
}
