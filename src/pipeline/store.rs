// file: src/pipeline/store.rs
// description: ordered file records with index-stable mutation and stale-update guard
// reference: records carry a uuid identity so async settlement never lands on a shifted slot

use crate::models::{FileRecordSnapshot, IntakeFile, Lifecycle, ValidationResult};
use crate::pipeline::progress::ProgressHandle;
use tracing::trace;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(Uuid);

impl RecordId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Correlation key for one validation attempt. Async work closes over this,
/// never over a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptTicket {
    pub record: RecordId,
    pub attempt: u64,
}

/// A freshly started attempt the orchestrator has to drive.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub ticket: AttemptTicket,
    pub file: IntakeFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPatch {
    Progress(u8),
    Settled(ValidationResult),
}

#[derive(Debug)]
struct FileRecord {
    id: RecordId,
    file: IntakeFile,
    lifecycle: Lifecycle,
    page_count: u32,
    error: Option<String>,
    progress: Option<u8>,
    attempt: u64,
    ticker: Option<ProgressHandle>,
}

impl FileRecord {
    fn pending(file: IntakeFile) -> Self {
        Self {
            id: RecordId::new(),
            file,
            lifecycle: Lifecycle::Pending,
            page_count: 0,
            error: None,
            progress: None,
            attempt: 0,
            ticker: None,
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    fn ticket(&self) -> AttemptTicket {
        AttemptTicket {
            record: self.id,
            attempt: self.attempt,
        }
    }

    fn snapshot(&self) -> FileRecordSnapshot {
        FileRecordSnapshot {
            file: self.file.clone(),
            lifecycle: self.lifecycle,
            page_count: self.page_count,
            error: self.error.clone(),
            progress: self.progress,
        }
    }
}

pub struct FileRecordStore {
    records: Vec<FileRecord>,
    capacity: usize,
    track_progress: bool,
    attempts: u64,
}

impl FileRecordStore {
    pub fn new(capacity: usize, track_progress: bool) -> Self {
        Self {
            records: Vec::new(),
            capacity,
            track_progress,
            attempts: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn available_slots(&self) -> usize {
        self.capacity.saturating_sub(self.records.len())
    }

    /// Appends one validating record per file, in order, until capacity is
    /// reached. The returned attempts are the files actually admitted.
    pub fn admit(&mut self, files: Vec<IntakeFile>) -> Vec<Attempt> {
        let slots = self.available_slots();
        let mut started = Vec::with_capacity(files.len().min(slots));

        for file in files.into_iter().take(slots) {
            let mut record = FileRecord::pending(file);
            started.push(begin_attempt(
                &mut record,
                &mut self.attempts,
                self.track_progress,
            ));
            self.records.push(record);
        }

        started
    }

    pub fn remove(&mut self, index: usize) -> Option<IntakeFile> {
        if index >= self.records.len() {
            return None;
        }
        let mut record = self.records.remove(index);
        record.stop_ticker();
        Some(record.file)
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.cancel_tickers();
        self.records.clear();
        removed
    }

    /// Moves the record at `from` to `to`. Returns false (and changes nothing)
    /// for equal or out-of-range indices.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.records.len();
        if from == to || from >= len || to >= len {
            return false;
        }
        let record = self.records.remove(from);
        self.records.insert(to, record);
        true
    }

    /// Positional update. An index past the end is a stale update and is dropped.
    pub fn update_at(&mut self, index: usize, patch: RecordPatch) -> bool {
        let track_progress = self.track_progress;
        match self.records.get_mut(index) {
            Some(record) => apply_patch(record, patch, track_progress),
            None => {
                trace!("Dropping update for vacated index {}", index);
                false
            }
        }
    }

    /// Identity-based update. Dropped when the record is gone or the ticket
    /// belongs to an earlier attempt.
    pub fn apply(&mut self, ticket: AttemptTicket, patch: RecordPatch) -> bool {
        match self.position_of(ticket) {
            Some(index) => self.update_at(index, patch),
            None => {
                trace!("Dropping stale update for {:?}", ticket);
                false
            }
        }
    }

    /// Restarts validation for the record at `index`, cancelling any running ticker.
    pub fn retry(&mut self, index: usize) -> Option<Attempt> {
        let record = self.records.get_mut(index)?;
        Some(begin_attempt(
            record,
            &mut self.attempts,
            self.track_progress,
        ))
    }

    /// Keeps `ticker` with the record if the ticket is still current; otherwise
    /// cancels it straight away.
    pub fn attach_ticker(&mut self, ticket: AttemptTicket, ticker: ProgressHandle) -> bool {
        match self.position_of(ticket) {
            Some(index) if self.records[index].lifecycle == Lifecycle::Validating => {
                let record = &mut self.records[index];
                record.stop_ticker();
                record.ticker = Some(ticker);
                true
            }
            _ => {
                ticker.cancel();
                false
            }
        }
    }

    pub fn cancel_tickers(&mut self) {
        for record in &mut self.records {
            record.stop_ticker();
        }
    }

    pub fn snapshots(&self) -> Vec<FileRecordSnapshot> {
        self.records.iter().map(FileRecord::snapshot).collect()
    }

    pub fn files(&self) -> Vec<IntakeFile> {
        self.records.iter().map(|r| r.file.clone()).collect()
    }

    fn position_of(&self, ticket: AttemptTicket) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.id == ticket.record && r.attempt == ticket.attempt)
    }
}

fn begin_attempt(record: &mut FileRecord, attempts: &mut u64, track_progress: bool) -> Attempt {
    record.stop_ticker();
    *attempts += 1;
    record.attempt = *attempts;
    record.lifecycle = Lifecycle::Validating;
    record.error = None;
    record.progress = track_progress.then_some(0);

    Attempt {
        ticket: record.ticket(),
        file: record.file.clone(),
    }
}

fn apply_patch(record: &mut FileRecord, patch: RecordPatch, track_progress: bool) -> bool {
    if record.lifecycle != Lifecycle::Validating {
        return false;
    }

    match patch {
        RecordPatch::Progress(percent) => {
            if !track_progress || record.progress.is_some_and(|p| percent <= p) {
                return false;
            }
            record.progress = Some(percent.min(100));
            true
        }
        RecordPatch::Settled(result) => {
            // ticker goes first so no tick can follow the final write
            record.stop_ticker();
            record.lifecycle = if result.is_valid {
                Lifecycle::Valid
            } else {
                Lifecycle::Invalid
            };
            record.page_count = result.page_count;
            record.error = if result.is_valid { None } else { result.error };
            record.progress = track_progress.then_some(100);
            true
        }
    }
}
