//! Job driver.
//!
//! A [`FileOpsJob`] runs one [`OperationRequest`] to completion, either
//! inline ([`FileOpsJob::run`]) or on a dedicated worker thread
//! ([`FileOpsJob::spawn`]) so the caller is never blocked.
//!
//! - `Delete`: deep count, then walk every root in order
//! - `MoveCleanup`: walk every root without counting progress
//! - `Trash`: trash every root; roots whose filesystem has no trash are
//!   deleted afterwards if the [`FallbackPolicy`] allows it
//!
//! The first root that fails ends the job. Nothing is rolled back.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};

use crate::count::{DeepCounter, WalkCounter};
use crate::fs::{FileEntry, FileSystem, LocalFs};
use crate::progress::{JobObserver, NullObserver, Phase, ProgressState, ProgressUpdate, Reporter};
use crate::signal::CancelToken;

use super::{Halt, OperationKind, OperationRequest, StepResult, TrashOrchestrator, TreeWalker};

/// What to do with roots that could not be moved to the trash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Ask the observer for confirmation
    #[default]
    Ask,
    /// Delete them permanently without asking
    Always,
    /// Leave them in place
    Never,
}

impl std::fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ask => write!(f, "ask"),
            Self::Always => write!(f, "always"),
            Self::Never => write!(f, "never"),
        }
    }
}

/// Errors from running a job on a worker thread.
#[derive(thiserror::Error, Debug)]
pub enum JobError {
    /// The worker thread could not be started.
    #[error("failed to start worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The worker thread panicked.
    #[error("worker thread panicked")]
    Panicked,
}

/// Final result of a job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    /// Operation kind
    pub kind: OperationKind,
    /// Overall Success/Failure
    pub success: bool,
    /// True if the job stopped because of the cancel token
    pub cancelled: bool,
    /// Work expected by the main phase (deep count, or number of roots)
    pub total: u64,
    /// Entries permanently deleted
    pub removed: u64,
    /// Roots moved to the trash
    pub trashed: u64,
    /// Roots that could not be trashed
    pub fallback: Vec<PathBuf>,
    /// True if `fallback` was deleted permanently
    pub fallback_applied: bool,
}

impl JobReport {
    fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            success: true,
            cancelled: false,
            total: 0,
            removed: 0,
            trashed: 0,
            fallback: Vec::new(),
            fallback_applied: false,
        }
    }

    fn record(&mut self, outcome: StepResult) {
        match outcome {
            Ok(()) => {}
            Err(Halt::Cancelled) => {
                self.success = false;
                self.cancelled = true;
            }
            Err(Halt::Failed) => self.success = false,
        }
    }

    /// Roots that still exist because the fallback was not applied.
    #[must_use]
    pub fn pending_fallback(&self) -> &[PathBuf] {
        if self.fallback_applied {
            &[]
        } else {
            &self.fallback
        }
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let status = if self.cancelled {
            "cancelled"
        } else if self.success {
            "completed"
        } else {
            "failed"
        };

        let mut summary = match self.kind {
            OperationKind::Trash => format!(
                "Trash {}: {} item(s) moved to trash, {} deleted",
                status, self.trashed, self.removed
            ),
            _ => format!("Delete {}: {} item(s) deleted", status, self.removed),
        };

        let pending = self.pending_fallback().len();
        if pending > 0 {
            summary.push_str(&format!(", {pending} item(s) left in place"));
        }
        summary
    }
}

/// A delete or trash job.
pub struct FileOpsJob {
    request: OperationRequest,
    fs: Arc<dyn FileSystem>,
    counter: Arc<dyn DeepCounter>,
    observer: Arc<dyn JobObserver>,
    state: Arc<ProgressState>,
    fallback: FallbackPolicy,
}

impl FileOpsJob {
    /// Create a job on the local filesystem with no observer.
    #[must_use]
    pub fn new(request: OperationRequest) -> Self {
        Self {
            request,
            fs: Arc::new(LocalFs::new()),
            counter: Arc::new(WalkCounter),
            observer: Arc::new(NullObserver),
            state: Arc::new(ProgressState::new()),
            fallback: FallbackPolicy::default(),
        }
    }

    /// Use a different filesystem backend.
    #[must_use]
    pub fn with_filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Use a different deep count estimator.
    #[must_use]
    pub fn with_counter(mut self, counter: Arc<dyn DeepCounter>) -> Self {
        self.counter = counter;
        self
    }

    /// Send notifications to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Set the trash fallback policy.
    #[must_use]
    pub fn with_fallback_policy(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Live progress counters, readable from any thread.
    #[must_use]
    pub fn progress(&self) -> Arc<ProgressState> {
        Arc::clone(&self.state)
    }

    /// The token that cancels this job.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.request.cancel_token().clone()
    }

    /// Run the job on the calling thread.
    #[must_use]
    pub fn run(&self) -> JobReport {
        let reporter = Reporter::new(Arc::clone(&self.state), Arc::clone(&self.observer));
        let paths = self.request.paths();
        log::info!(
            "Starting {} of {} item(s)",
            self.request.kind(),
            paths.len()
        );

        let report = match self.request.kind() {
            OperationKind::Delete => self.run_delete(&reporter, paths, Phase::Delete),
            OperationKind::MoveCleanup => self.run_delete(&reporter, paths, Phase::MoveCleanup),
            OperationKind::Trash => self.run_trash(&reporter, paths),
        };

        log::info!("{}", report.summary());
        self.observer.on_finished(&report);
        report
    }

    /// Run the job on a dedicated worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Spawn`] if the thread cannot be created.
    pub fn spawn(self) -> Result<JobHandle, JobError> {
        let cancel = self.cancel_token();
        let state = self.progress();
        let worker = thread::Builder::new()
            .name("sweeper-job".to_string())
            .spawn(move || self.run())?;

        Ok(JobHandle {
            cancel,
            state,
            worker,
        })
    }

    fn run_delete(&self, reporter: &Reporter, paths: &[PathBuf], phase: Phase) -> JobReport {
        let mut report = JobReport::new(self.request.kind());
        let (outcome, removed, total) = self.delete_roots(reporter, paths, phase);
        report.total = total;
        report.removed = removed;
        report.record(outcome);
        report
    }

    fn run_trash(&self, reporter: &Reporter, paths: &[PathBuf]) -> JobReport {
        let mut report = JobReport::new(OperationKind::Trash);
        report.total = paths.len() as u64;

        let cancel = self.request.cancel_token();
        let trash = TrashOrchestrator::new(self.fs.as_ref(), reporter, cancel).run(paths);
        report.trashed = trash.trashed;
        report.success = trash.success;
        report.cancelled = trash.cancelled;
        report.fallback = trash.fallback_paths();

        if !trash.success || report.fallback.is_empty() {
            return report;
        }

        let approved = match self.fallback {
            FallbackPolicy::Always => true,
            FallbackPolicy::Never => false,
            FallbackPolicy::Ask => self.observer.confirm_fallback(&report.fallback),
        };
        if !approved {
            log::info!(
                "Leaving {} item(s) that cannot be trashed in place",
                report.fallback.len()
            );
            return report;
        }

        let fallback = report.fallback.clone();
        let (outcome, removed, _) = self.delete_roots(reporter, &fallback, Phase::Fallback);
        report.removed = removed;
        report.fallback_applied = true;
        report.record(outcome);
        report
    }

    /// Walk and delete `paths` in order. Returns the outcome, the number of
    /// removed entries, and the total announced for the phase.
    fn delete_roots(
        &self,
        reporter: &Reporter,
        paths: &[PathBuf],
        phase: Phase,
    ) -> (StepResult, u64, u64) {
        let cancel = self.request.cancel_token();
        let counting = self.request.kind().counts_progress();

        let total = if counting {
            self.counter.count(paths, cancel)
        } else {
            0
        };
        log::debug!("Total number of items to delete: {}", total);
        reporter.begin_phase(phase, total);

        let mut walker =
            TreeWalker::new(self.fs.as_ref(), reporter, cancel).with_progress_counting(counting);

        for path in paths {
            if cancel.is_cancelled() {
                return (Err(Halt::Cancelled), walker.removed(), total);
            }
            if let Err(halt) = walker.process(FileEntry::new(path.clone())) {
                log::debug!("Stopped at {}: {:?}", path.display(), halt);
                return (Err(halt), walker.removed(), total);
            }
        }

        (Ok(()), walker.removed(), total)
    }
}

/// Handle on a job running on its worker thread.
pub struct JobHandle {
    cancel: CancelToken,
    state: Arc<ProgressState>,
    worker: JoinHandle<JobReport>,
}

impl JobHandle {
    /// Request cancellation. The worker stops at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Current progress of the running phase.
    #[must_use]
    pub fn progress(&self) -> ProgressUpdate {
        self.state.update()
    }

    /// Display name of the entry being processed.
    #[must_use]
    pub fn current_file(&self) -> String {
        self.state.current_file()
    }

    /// Whether the worker has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the job to finish.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Panicked`] if the worker thread panicked.
    pub fn join(self) -> Result<JobReport, JobError> {
        self.worker.join().map_err(|_| JobError::Panicked)
    }
}
