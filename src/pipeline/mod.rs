// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: intake orchestration

mod auto_advance;
mod gate;
mod orchestrator;
mod progress;
mod store;

pub use auto_advance::AutoAdvanceController;
pub use gate::{GateBlock, GateVerdict, can_continue};
pub use orchestrator::{AdmissionOutcome, ContinuationBatch, IntakeOrchestrator, IntakeSnapshot};
pub use progress::{FRAME_INTERVAL, MAX_SIMULATED_PERCENT, ProgressHandle, ProgressSimulator};
pub use store::{Attempt, AttemptTicket, FileRecordStore, RecordId, RecordPatch};
