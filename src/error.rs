// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use crate::pipeline::GateBlock;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IntakeError>;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No file at index {index} (intake holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Cannot continue: {0}")]
    ContinuationBlocked(GateBlock),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },
}
