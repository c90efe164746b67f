// file: src/report/mod.rs
// description: reporting module exports
// reference: internal module structure

pub mod terminal;

pub use terminal::{IntakeProgressView, IntakeSummary, print_summary, summary_lines};
