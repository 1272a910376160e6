//! Depth-first deletion walk.
//!
//! # Overview
//!
//! [`TreeWalker::process`] removes one root and everything below it:
//!
//! 1. Resolve metadata (inspect lazily if the caller did not supply it)
//! 2. Report the entry as the current file
//! 3. Advance progress, *before* deleting (progress counts visited items)
//! 4. Stop if cancelled
//! 5. For a directory, process every child first
//! 6. Stop if cancelled, leaving the emptied directory in place
//! 7. Remove the entry
//!
//! Symlinks are never followed; a link to a directory is removed as a link.
//! Children are visited in whatever order the filesystem yields them.
//!
//! The first failure anywhere in a subtree unwinds the whole root: remaining
//! siblings are not visited and no parent is removed. Already removed entries
//! stay removed.

use std::path::Path;

use crate::fs::{FileEntry, FileSystem};
use crate::progress::Reporter;
use crate::signal::CancelToken;

use super::{delete, inspect, Halt, OpError, StepResult};

/// Recursive deleter for one job.
pub struct TreeWalker<'a> {
    fs: &'a dyn FileSystem,
    reporter: &'a Reporter,
    cancel: &'a CancelToken,
    count_progress: bool,
    removed: u64,
}

impl<'a> TreeWalker<'a> {
    /// Create a walker that advances progress for every visited entry.
    #[must_use]
    pub fn new(fs: &'a dyn FileSystem, reporter: &'a Reporter, cancel: &'a CancelToken) -> Self {
        Self {
            fs,
            reporter,
            cancel,
            count_progress: true,
            removed: 0,
        }
    }

    /// Enable/disable progress counting (disabled for move cleanup).
    #[must_use]
    pub fn with_progress_counting(mut self, enabled: bool) -> Self {
        self.count_progress = enabled;
        self
    }

    /// Number of entries removed so far.
    #[must_use]
    pub fn removed(&self) -> u64 {
        self.removed
    }

    /// Remove `entry` and, for a directory, its whole subtree.
    ///
    /// # Errors
    ///
    /// [`Halt::Cancelled`] once the cancel token is observed set,
    /// [`Halt::Failed`] after an error has been reported to the observer.
    pub fn process(&mut self, entry: FileEntry) -> StepResult {
        let (path, info) = match inspect::resolve(self.fs, entry) {
            Ok(resolved) => resolved,
            Err(err) => return Err(self.fail(&err, false)),
        };

        self.reporter.emit_current_file(&info.display_name);

        if self.count_progress {
            self.reporter.advance();
            self.reporter.emit_percent();
        }

        self.check_cancelled()?;

        if info.kind.is_dir() {
            self.process_children(&path)?;
            self.check_cancelled()?;
        }

        match delete::remove(self.fs, &path, &info) {
            Ok(()) => {
                self.removed += 1;
                Ok(())
            }
            Err(err) => Err(self.fail(&err, true)),
        }
    }

    fn process_children(&mut self, dir: &Path) -> StepResult {
        // Copy out the reference so the iterator does not borrow `self`
        let fs: &'a dyn FileSystem = self.fs;

        let children = match fs.enumerate_children(dir) {
            Ok(children) => children,
            Err(source) => {
                let err = OpError::Enumerate {
                    path: dir.to_path_buf(),
                    source,
                };
                return Err(self.fail(&err, false));
            }
        };

        for child in children {
            self.check_cancelled()?;

            match child {
                Ok(entry) => self.process(entry)?,
                Err(source) => {
                    let err = OpError::Enumerate {
                        path: dir.to_path_buf(),
                        source,
                    };
                    return Err(self.fail(&err, false));
                }
            }
        }

        Ok(())
    }

    fn check_cancelled(&self) -> StepResult {
        if self.cancel.is_cancelled() {
            Err(Halt::Cancelled)
        } else {
            Ok(())
        }
    }

    fn fail(&self, err: &OpError, fatal: bool) -> Halt {
        self.reporter.emit_error(err, fatal);
        Halt::Failed
    }
}
