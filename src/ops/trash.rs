//! Move-to-trash orchestration.
//!
//! # Overview
//!
//! Trashing acts on whole subtrees through the backend primitive, so only
//! the top-level roots are visited; nothing here recurses.
//!
//! Each failure is classified:
//! - [`FailureCause::Unsupported`]: the filesystem has no usable trash, or
//!   the entry already lives in the trash. The root is queued in the
//!   fallback list and the loop continues.
//! - [`FailureCause::Other`]: reported as fatal; the whole batch stops.
//!
//! After the loop a non-empty fallback list resets the progress baseline
//! to its own length. Whether it is then deleted is the job driver's call.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::fs::{display_name, FileSystem, FsError};
use crate::progress::{Phase, Reporter};
use crate::signal::CancelToken;

use super::{FailureCause, FailureRecord, OpError};

/// Outcome of a trash run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrashReport {
    /// False after a fatal failure or cancellation
    pub success: bool,
    /// True if the loop stopped because of the cancel token
    pub cancelled: bool,
    /// Roots moved to the trash
    pub trashed: u64,
    /// Every root that could not be trashed, in processing order
    pub failures: Vec<FailureRecord>,
}

impl TrashReport {
    /// Roots eligible for fallback deletion.
    #[must_use]
    pub fn fallback_paths(&self) -> Vec<PathBuf> {
        self.failures
            .iter()
            .filter(|record| record.cause == FailureCause::Unsupported)
            .map(|record| record.path.clone())
            .collect()
    }
}

/// Top-level trash loop for one job.
pub struct TrashOrchestrator<'a> {
    fs: &'a dyn FileSystem,
    reporter: &'a Reporter,
    cancel: &'a CancelToken,
}

impl<'a> TrashOrchestrator<'a> {
    /// Create an orchestrator.
    #[must_use]
    pub fn new(fs: &'a dyn FileSystem, reporter: &'a Reporter, cancel: &'a CancelToken) -> Self {
        Self {
            fs,
            reporter,
            cancel,
        }
    }

    /// Move every root in `paths` to the trash.
    #[must_use]
    pub fn run(&self, paths: &[PathBuf]) -> TrashReport {
        let mut report = TrashReport {
            success: true,
            ..TrashReport::default()
        };

        self.reporter.begin_phase(Phase::Trash, paths.len() as u64);

        for path in paths {
            if self.cancel.is_cancelled() {
                log::debug!("Trash cancelled after {} item(s)", report.trashed);
                report.cancelled = true;
                report.success = false;
                return report;
            }

            self.reporter.emit_current_file(&root_display_name(path));

            match self.trash_one(path) {
                Ok(()) => {
                    report.trashed += 1;
                    self.reporter.advance();
                    self.reporter.emit_percent();
                }
                Err(source) if source.is_unsupported() => {
                    let message = match &source {
                        FsError::Unsupported { message, .. } => message.clone(),
                        other => other.to_string(),
                    };
                    let err = OpError::TrashUnsupported {
                        path: path.clone(),
                        message: message.clone(),
                    };
                    self.reporter.emit_error(&err, false);
                    report.failures.push(FailureRecord {
                        path: path.clone(),
                        cause: FailureCause::Unsupported,
                        message,
                    });
                }
                Err(source) => {
                    let err = OpError::Trash {
                        path: path.clone(),
                        source,
                    };
                    self.reporter.emit_error(&err, true);
                    report.failures.push(FailureRecord {
                        path: path.clone(),
                        cause: FailureCause::Other,
                        message: err.to_string(),
                    });
                    report.success = false;
                    return report;
                }
            }
        }

        let fallback = report.failures.len() as u64;
        if fallback > 0 {
            log::info!("{} item(s) cannot be moved to trash", fallback);
            self.reporter.reset(fallback);
            self.reporter.emit_percent();
        }

        report
    }

    fn trash_one(&self, path: &Path) -> Result<(), FsError> {
        if self.fs.is_in_trash(path) {
            return Err(FsError::Unsupported {
                path: path.to_path_buf(),
                message: "already in the trash".to_string(),
            });
        }
        self.fs.trash(path)?;
        log::debug!("Moved to trash: {}", path.display());
        Ok(())
    }
}

fn root_display_name(path: &Path) -> String {
    display_name(path.file_name().unwrap_or(path.as_os_str()))
}
