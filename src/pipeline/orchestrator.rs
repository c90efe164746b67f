// file: src/pipeline/orchestrator.rs
// description: coordinates admission, per-file progress and validation, gating and auto-advance
// reference: orchestrates asynchronous intake workflow on the tokio runtime

use crate::config::IntakeConfiguration;
use crate::error::{IntakeError, Result};
use crate::models::{FileRecordSnapshot, IntakeFile, IntakeNotice, ValidationResult};
use crate::pipeline::auto_advance::AutoAdvanceController;
use crate::pipeline::gate::{GateBlock, GateVerdict, can_continue};
use crate::pipeline::progress::ProgressSimulator;
use crate::pipeline::store::{Attempt, AttemptTicket, FileRecordStore, RecordPatch};
use crate::validator::{FileValidator, run_validation};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// Files handed to the processing step, index-aligned with their records.
#[derive(Debug, Clone)]
pub struct ContinuationBatch {
    pub files: Vec<IntakeFile>,
    pub records: Vec<FileRecordSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeSnapshot {
    pub records: Vec<FileRecordSnapshot>,
    pub verdict: GateVerdict,
    pub notice: Option<IntakeNotice>,
}

impl IntakeSnapshot {
    pub fn all_settled(&self) -> bool {
        self.records.iter().all(|r| r.lifecycle.is_settled())
    }

    pub fn total_pages(&self) -> u32 {
        self.records
            .iter()
            .filter(|r| r.is_valid())
            .map(|r| r.page_count)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionOutcome {
    pub requested: usize,
    pub admitted: usize,
    pub notice: Option<IntakeNotice>,
}

type ContinuationHandler = Box<dyn Fn(ContinuationBatch) + Send + Sync>;

struct SessionState {
    store: FileRecordStore,
    notice: Option<IntakeNotice>,
    auto_advance: AutoAdvanceController,
    disposed: bool,
}

struct Shared {
    config: Arc<IntakeConfiguration>,
    validator: Arc<dyn FileValidator>,
    on_continue: ContinuationHandler,
    state: Mutex<SessionState>,
    updates: watch::Sender<IntakeSnapshot>,
}

/// Entry point for UI collaborators. All operations address records by their
/// current position; async work is correlated by record identity internally.
///
/// Must be used from inside a tokio runtime. Dropping it disposes the session.
pub struct IntakeOrchestrator {
    shared: Arc<Shared>,
}

impl IntakeOrchestrator {
    pub fn new<F>(
        config: IntakeConfiguration,
        validator: Arc<dyn FileValidator>,
        on_continue: F,
    ) -> Result<Self>
    where
        F: Fn(ContinuationBatch) + Send + Sync + 'static,
    {
        config.validate()?;

        let store = FileRecordStore::new(config.capacity, config.progress.enabled());
        let auto_advance = AutoAdvanceController::new(&config.auto_advance);
        let initial = IntakeSnapshot {
            records: Vec::new(),
            verdict: can_continue(&[], &config),
            notice: None,
        };
        let (updates, _) = watch::channel(initial);

        Ok(Self {
            shared: Arc::new(Shared {
                config: Arc::new(config),
                validator,
                on_continue: Box::new(on_continue),
                state: Mutex::new(SessionState {
                    store,
                    notice: None,
                    auto_advance,
                    disposed: false,
                }),
                updates,
            }),
        })
    }

    pub fn config(&self) -> &IntakeConfiguration {
        &self.shared.config
    }

    /// Admits as many of `selected` as size limit and free slots allow, in order,
    /// and starts progress plus validation for each admitted file.
    pub fn add_files(&self, selected: Vec<IntakeFile>) -> AdmissionOutcome {
        let shared = &self.shared;
        let config = &shared.config;
        let requested = selected.len();
        let mut state = shared.lock();
        state.notice = None;

        if state.store.available_slots() == 0 {
            let notice = IntakeNotice::capacity_exceeded(config.capacity);
            warn!("{}", notice);
            state.notice = Some(notice.clone());
            shared.publish(&state);
            return AdmissionOutcome {
                requested,
                admitted: 0,
                notice: Some(notice),
            };
        }

        let (fitting, oversized): (Vec<_>, Vec<_>) = selected
            .into_iter()
            .partition(|file| config.max_file_size.is_none_or(|max| file.size() <= max));

        let mut notice = None;
        if let Some(max) = config.max_file_size
            && !oversized.is_empty()
        {
            let names: Vec<String> = oversized.iter().map(|f| f.name().to_string()).collect();
            notice = Some(IntakeNotice::oversized(&names, max));
        }

        let candidates = fitting.len();
        let attempts = state.store.admit(fitting);
        let admitted = attempts.len();

        if admitted < candidates {
            let partial = IntakeNotice::partial_admission(admitted, config.capacity);
            notice = Some(match notice {
                Some(oversized) => oversized.combine(partial),
                None => partial,
            });
        }
        if let Some(notice) = &notice {
            warn!("{}", notice);
        }

        debug!("Admitted {} of {} selected file(s)", admitted, requested);
        for attempt in attempts {
            shared.launch(&mut state, attempt);
        }

        state.notice = notice.clone();
        shared.after_change(&mut state);

        AdmissionOutcome {
            requested,
            admitted,
            notice,
        }
    }

    pub fn remove_file(&self, index: usize) -> Result<IntakeFile> {
        let mut state = self.shared.lock();
        let len = state.store.len();
        let removed = state
            .store
            .remove(index)
            .ok_or(IntakeError::IndexOutOfRange { index, len })?;

        debug!("Removed {} from position {}", removed.name(), index);
        state.notice = None;
        self.shared.after_change(&mut state);
        Ok(removed)
    }

    pub fn clear_all(&self) {
        let mut state = self.shared.lock();
        let removed = state.store.clear();
        debug!("Cleared {} file(s)", removed);
        state.notice = None;
        self.shared.after_change(&mut state);
    }

    /// Restarts validation for the record at `index`. Any attempt still in
    /// flight for it is abandoned and its eventual result discarded.
    pub fn retry_file(&self, index: usize) -> Result<()> {
        let mut state = self.shared.lock();
        let len = state.store.len();
        let attempt = state
            .store
            .retry(index)
            .ok_or(IntakeError::IndexOutOfRange { index, len })?;

        debug!("Retrying {} at position {}", attempt.file.name(), index);
        self.shared.launch(&mut state, attempt);
        self.shared.after_change(&mut state);
        Ok(())
    }

    /// Moves a record. Equal or out-of-range indices are ignored.
    pub fn reorder_files(&self, from: usize, to: usize) -> bool {
        let mut state = self.shared.lock();
        let moved = state.store.reorder(from, to);
        if moved {
            self.shared.after_change(&mut state);
        }
        moved
    }

    /// Hands the current files to the continuation callback. Rejected while the
    /// gate is closed.
    pub fn proceed(&self) -> Result<ContinuationBatch> {
        let batch = {
            let mut state = self.shared.lock();
            let records = state.store.snapshots();
            let verdict = can_continue(&records, &self.shared.config);

            if !verdict.allowed {
                let reason = verdict.reason.unwrap_or(GateBlock::ConditionUnmet);
                return Err(IntakeError::ContinuationBlocked(reason));
            }

            state.auto_advance.disarm();
            ContinuationBatch {
                files: state.store.files(),
                records,
            }
        };

        info!("Continuing with {} file(s)", batch.files.len());
        (self.shared.on_continue)(batch.clone());
        Ok(batch)
    }

    pub fn snapshot(&self) -> IntakeSnapshot {
        let state = self.shared.lock();
        self.shared.snapshot_of(&state)
    }

    pub fn records(&self) -> Vec<FileRecordSnapshot> {
        self.shared.lock().store.snapshots()
    }

    pub fn verdict(&self) -> GateVerdict {
        let records = self.records();
        can_continue(&records, &self.shared.config)
    }

    pub fn notice(&self) -> Option<IntakeNotice> {
        self.shared.lock().notice.clone()
    }

    pub fn len(&self) -> usize {
        self.shared.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().store.is_empty()
    }

    /// Receives a fresh snapshot on every change, progress ticks included.
    pub fn subscribe(&self) -> watch::Receiver<IntakeSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Resolves once no record is pending or validating, with the snapshot of
    /// that moment. An empty intake counts as settled.
    pub async fn settled(&self) -> IntakeSnapshot {
        let mut updates = self.subscribe();
        match updates.wait_for(IntakeSnapshot::all_settled).await {
            Ok(snapshot) => snapshot.clone(),
            // sender lives in `shared`, which `self` keeps alive
            Err(_) => self.snapshot(),
        }
    }

    /// Stops all tickers and any armed auto-advance. Validations still in flight
    /// settle into the store but can no longer trigger a continuation.
    pub fn dispose(&self) {
        let mut state = self.shared.lock();
        if state.disposed {
            return;
        }
        state.disposed = true;
        state.auto_advance.dispose();
        state.store.cancel_tickers();
        debug!("Intake session disposed");
    }
}

impl Drop for IntakeOrchestrator {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot_of(&self, state: &SessionState) -> IntakeSnapshot {
        let records = state.store.snapshots();
        let verdict = can_continue(&records, &self.config);
        IntakeSnapshot {
            records,
            verdict,
            notice: state.notice.clone(),
        }
    }

    fn publish(&self, state: &SessionState) {
        self.updates.send_replace(self.snapshot_of(state));
    }

    /// Gate inputs changed: re-run auto-advance from scratch and publish.
    fn after_change(self: &Arc<Self>, state: &mut SessionState) {
        let snapshot = self.snapshot_of(state);

        let should_advance = match &self.config.auto_advance.condition {
            Some(condition) => condition.evaluate(&snapshot.records),
            None => snapshot.verdict.allowed,
        };

        let weak = Arc::downgrade(self);
        state.auto_advance.reevaluate(should_advance, move |generation| {
            if let Some(shared) = weak.upgrade() {
                shared.auto_continue(generation);
            }
        });

        self.updates.send_replace(snapshot);
    }

    fn launch(self: &Arc<Self>, state: &mut SessionState, attempt: Attempt) {
        let Attempt { ticket, file } = attempt;

        if self.config.progress.enabled() {
            let weak: Weak<Shared> = Arc::downgrade(self);
            let ticker = ProgressSimulator::start(self.config.progress.duration(), move |percent| {
                if let Some(shared) = weak.upgrade() {
                    shared.record_progress(ticket, percent);
                }
            });
            state.store.attach_ticker(ticket, ticker);
        }

        let shared = Arc::clone(self);
        let validator = Arc::clone(&self.validator);
        tokio::spawn(async move {
            let result = run_validation(validator, file).await;
            shared.settle(ticket, result);
        });
    }

    fn record_progress(&self, ticket: AttemptTicket, percent: u8) {
        let mut state = self.lock();
        if state.store.apply(ticket, RecordPatch::Progress(percent)) {
            self.publish(&state);
        }
    }

    fn settle(self: &Arc<Self>, ticket: AttemptTicket, result: ValidationResult) {
        let mut state = self.lock();
        let valid = result.is_valid;

        if !state.store.apply(ticket, RecordPatch::Settled(result)) {
            trace!("Discarded settlement for {:?}", ticket);
            return;
        }

        debug!("Attempt {} settled (valid: {})", ticket.attempt, valid);
        if state.disposed {
            self.publish(&state);
        } else {
            self.after_change(&mut state);
        }
    }

    fn auto_continue(&self, generation: u64) {
        let batch = {
            let mut state = self.lock();
            if state.disposed || !state.auto_advance.complete(generation) {
                return;
            }
            ContinuationBatch {
                files: state.store.files(),
                records: state.store.snapshots(),
            }
        };

        info!("Auto-advancing with {} file(s)", batch.files.len());
        (self.on_continue)(batch);
    }
}
