//! Progress state, observer notifications, and the terminal progress bar.
//!
//! # Overview
//!
//! - [`ProgressState`]: finished/total counters plus the current file name,
//!   readable from any thread while the worker updates them
//! - [`JobObserver`]: receives current-file, percentage, error, and fallback
//!   confirmation callbacks
//! - [`Reporter`]: the single entry point the worker uses to mutate state and
//!   notify the observer
//! - [`Progress`]: a [`JobObserver`] rendering an `indicatif` bar
//!
//! # Accessible Mode
//!
//! When accessible mode is enabled, the bar uses ASCII characters only and
//! no colors, for screen reader compatibility.

use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use indicatif::{ProgressBar, ProgressStyle};
use yansi::Paint;

use crate::ops::{JobReport, OpError};

/// Maximum number of fallback entries listed in the confirmation prompt.
const PROMPT_LIST_LIMIT: usize = 10;

/// Stage of a job, announced through [`JobObserver::on_phase_start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Permanent deletion of the requested roots.
    Delete,
    /// Moving the requested roots to the trash.
    Trash,
    /// Permanent deletion of roots that could not be trashed.
    Fallback,
    /// Source cleanup after a cross-filesystem move (no progress counting).
    MoveCleanup,
}

impl Phase {
    /// Short label used in progress messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Delete => "Deleting",
            Self::Trash => "Moving to trash",
            Self::Fallback => "Deleting (trash unsupported)",
            Self::MoveCleanup => "Removing sources",
        }
    }
}

/// Compute `finished * 100 / total`, clamped to `[0, 100]`.
///
/// An empty job is complete, so `total == 0` yields 100.
///
/// # Examples
///
/// ```
/// use sweeper::progress::percent_of;
///
/// assert_eq!(percent_of(1, 4), 25);
/// assert_eq!(percent_of(0, 0), 100);
/// assert_eq!(percent_of(9, 3), 100);
/// ```
#[must_use]
pub fn percent_of(finished: u64, total: u64) -> u32 {
    if total == 0 {
        return 100;
    }
    let percent = u128::from(finished) * 100 / u128::from(total);
    percent.min(100) as u32
}

/// A consistent-enough view of [`ProgressState`] for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Items visited in the current phase
    pub finished: u64,
    /// Items expected in the current phase
    pub total: u64,
    /// `finished / total` as a percentage
    pub percent: u32,
}

/// Shared progress counters.
///
/// Only the job's worker writes; any thread may read. `finished` never
/// exceeds `total`: when the deep count underestimated the work, progress
/// stays at 100% instead of overshooting.
#[derive(Debug, Default)]
pub struct ProgressState {
    total: AtomicU64,
    finished: AtomicU64,
    current: Mutex<String>,
}

impl ProgressState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new phase: set `total` and reset `finished` to zero.
    pub fn begin(&self, total: u64) {
        self.finished.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    /// Count one more finished item, saturating at `total`.
    ///
    /// Returns the new finished count.
    pub fn advance(&self) -> u64 {
        let total = self.total.load(Ordering::SeqCst);
        let previous = self
            .finished
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |finished| {
                (finished < total).then_some(finished + 1)
            });
        match previous {
            Ok(finished) => finished + 1,
            Err(finished) => finished,
        }
    }

    /// Record the display name of the entry being processed.
    pub fn set_current_file(&self, name: &str) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current = name.to_owned();
    }

    /// Items expected in the current phase.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Items visited in the current phase.
    #[must_use]
    pub fn finished(&self) -> u64 {
        self.finished.load(Ordering::SeqCst)
    }

    /// Display name of the entry being processed.
    #[must_use]
    pub fn current_file(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn update(&self) -> ProgressUpdate {
        let total = self.total();
        let finished = self.finished().min(total);
        ProgressUpdate {
            finished,
            total,
            percent: percent_of(finished, total),
        }
    }
}

/// Receives notifications from a running job.
///
/// Callbacks run on the job's worker thread.
pub trait JobObserver: Send + Sync {
    /// A phase starts with `total` expected items.
    fn on_phase_start(&self, _phase: Phase, _total: u64) {}

    /// The entry named `name` is being processed.
    fn on_current_file(&self, name: &str);

    /// Progress changed.
    fn on_percent(&self, update: ProgressUpdate);

    /// An error occurred. `fatal` errors end the operation; the others end
    /// processing of a single entry or subtree.
    fn on_error(&self, error: &OpError, fatal: bool);

    /// Some roots could not be trashed. Return `true` to delete them
    /// permanently instead.
    fn confirm_fallback(&self, _paths: &[PathBuf]) -> bool {
        false
    }

    /// The job is over.
    fn on_finished(&self, _report: &JobReport) {}
}

/// Observer that ignores everything and declines the fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl JobObserver for NullObserver {
    fn on_current_file(&self, _name: &str) {}
    fn on_percent(&self, _update: ProgressUpdate) {}
    fn on_error(&self, _error: &OpError, _fatal: bool) {}
}

/// The worker's handle on progress state and the observer.
pub struct Reporter {
    state: Arc<ProgressState>,
    observer: Arc<dyn JobObserver>,
}

impl Reporter {
    /// Create a reporter writing to `state` and notifying `observer`.
    #[must_use]
    pub fn new(state: Arc<ProgressState>, observer: Arc<dyn JobObserver>) -> Self {
        Self { state, observer }
    }

    /// Shared progress state.
    #[must_use]
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Reset counters for `phase` and announce it.
    pub fn begin_phase(&self, phase: Phase, total: u64) {
        log::debug!("{}: {} item(s)", phase.label(), total);
        self.state.begin(total);
        self.observer.on_phase_start(phase, total);
    }

    /// Reset counters without announcing a new phase.
    pub fn reset(&self, total: u64) {
        self.state.begin(total);
    }

    /// Count one more finished item.
    pub fn advance(&self) {
        self.state.advance();
    }

    /// Publish the entry being processed.
    pub fn emit_current_file(&self, name: &str) {
        self.state.set_current_file(name);
        self.observer.on_current_file(name);
    }

    /// Publish the current percentage.
    pub fn emit_percent(&self) {
        self.observer.on_percent(self.state.update());
    }

    /// Publish an error. Never stops the job by itself.
    pub fn emit_error(&self, error: &OpError, fatal: bool) {
        if fatal {
            log::debug!("Fatal error: {}", error);
        } else {
            log::debug!("Error: {}", error);
        }
        self.observer.on_error(error, fatal);
    }
}

/// Terminal observer using indicatif.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
    show_bar: bool,
    accessible: bool,
    assume_yes: bool,
}

impl Progress {
    /// Create a terminal observer.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no bar is drawn and only fatal errors are printed.
    ///
    /// # Examples
    ///
    /// ```
    /// use sweeper::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self::with_accessible(quiet, false)
    }

    /// Create a terminal observer with accessible mode.
    #[must_use]
    pub fn with_accessible(quiet: bool, accessible: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
            show_bar: !quiet,
            accessible,
            assume_yes: false,
        }
    }

    /// Draw the bar or not. Errors are printed either way.
    #[must_use]
    pub fn with_bar(mut self, show_bar: bool) -> Self {
        self.show_bar = show_bar && !self.quiet;
        self
    }

    /// Approve the trash fallback without prompting.
    #[must_use]
    pub fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    /// Check if accessible mode is enabled.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    fn style(&self) -> ProgressStyle {
        if self.accessible {
            ProgressStyle::with_template("[{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-")
        } else {
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.red/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
        }
    }

    /// Print a line above the bar (or straight to stderr without one).
    fn print_line(&self, line: &str) {
        match &*self.bar.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(pb) => pb.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn prompt(&self, paths: &[PathBuf]) -> bool {
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            log::warn!(
                "{} item(s) cannot be trashed; not deleting them without confirmation",
                paths.len()
            );
            return false;
        }

        let guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        let ask = || {
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "These items cannot be moved to trash because their filesystem does not support it:"
            );
            for path in paths.iter().take(PROMPT_LIST_LIMIT) {
                let _ = writeln!(stderr, "  {}", path.display());
            }
            if paths.len() > PROMPT_LIST_LIMIT {
                let _ = writeln!(stderr, "  ... and {} more", paths.len() - PROMPT_LIST_LIMIT);
            }
            let _ = write!(stderr, "{} [y/N] ", "Delete them permanently instead?".bold());
            let _ = stderr.flush();

            let mut answer = String::new();
            if stdin.lock().read_line(&mut answer).is_err() {
                return false;
            }
            matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        };

        match &*guard {
            Some(pb) => pb.suspend(ask),
            None => ask(),
        }
    }
}

impl JobObserver for Progress {
    fn on_phase_start(&self, phase: Phase, total: u64) {
        if !self.show_bar {
            return;
        }

        let pb = if phase == Phase::MoveCleanup {
            ProgressBar::new_spinner()
        } else {
            let pb = ProgressBar::new(total);
            pb.set_style(self.style());
            pb
        };
        pb.set_message(phase.label());

        let mut bar = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = bar.replace(pb) {
            previous.finish_and_clear();
        }
    }

    fn on_current_file(&self, name: &str) {
        if let Some(pb) = &*self.bar.lock().unwrap_or_else(PoisonError::into_inner) {
            pb.set_message(truncate_name(name, 30));
        }
    }

    fn on_percent(&self, update: ProgressUpdate) {
        if let Some(pb) = &*self.bar.lock().unwrap_or_else(PoisonError::into_inner) {
            pb.set_length(update.total);
            pb.set_position(update.finished);
        }
    }

    fn on_error(&self, error: &OpError, fatal: bool) {
        if self.quiet && !fatal {
            return;
        }
        let line = if self.accessible {
            format!("{}: {}", if fatal { "error" } else { "warning" }, error)
        } else if fatal {
            format!("{}: {}", "error".red().bold(), error)
        } else {
            format!("{}: {}", "warning".yellow().bold(), error)
        };
        self.print_line(&line);
    }

    fn confirm_fallback(&self, paths: &[PathBuf]) -> bool {
        if self.assume_yes {
            log::info!("Deleting {} untrashable item(s) (--yes)", paths.len());
            return true;
        }
        self.prompt(paths)
    }

    fn on_finished(&self, report: &JobReport) {
        if let Some(pb) = self.bar.lock().unwrap_or_else(PoisonError::into_inner).take() {
            if report.cancelled {
                pb.abandon_with_message("Cancelled");
            } else if report.success {
                pb.finish_with_message("Done");
            } else {
                pb.abandon_with_message("Failed");
            }
        }
    }
}

/// Truncate a display name for the progress bar message.
fn truncate_name(name: &str, max_chars: usize) -> String {
    let count = name.chars().count();
    if count <= max_chars {
        return name.to_string();
    }
    let tail: String = name.chars().skip(count - (max_chars - 3)).collect();
    format!("...{tail}")
}
