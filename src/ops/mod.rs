//! Delete and trash operations.
//!
//! This module holds the traversal-and-deletion state machine:
//! - [`inspect`]: lazy metadata lookup for a single entry
//! - [`walker`]: depth-first walk that removes children before their parent
//! - [`delete`]: the terminal removal step
//! - [`trash`]: top-level move-to-trash loop with failure partitioning
//! - [`job`]: the driver that picks a path, runs it, and owns the worker thread
//!
//! # Example
//!
//! ```no_run
//! use sweeper::ops::{FileOpsJob, OperationKind, OperationRequest};
//! use std::path::PathBuf;
//!
//! let request = OperationRequest::new(OperationKind::Delete, vec![PathBuf::from("/tmp/junk")]);
//! let report = FileOpsJob::new(request).run();
//! println!("{}", report.summary());
//! ```

pub mod delete;
pub mod inspect;
pub mod job;
pub mod trash;
pub mod walker;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::fs::FsError;
use crate::signal::CancelToken;

pub use job::{FallbackPolicy, FileOpsJob, JobError, JobHandle, JobReport};
pub use trash::{TrashOrchestrator, TrashReport};
pub use walker::TreeWalker;

/// What a job does with its roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Permanently delete every root and everything below it.
    Delete,
    /// Move every root to the trash, falling back to delete where needed.
    Trash,
    /// Delete the sources of a cross-filesystem move. Same as `Delete`, but
    /// progress belongs to the copy phase and is not advanced here.
    MoveCleanup,
}

impl OperationKind {
    /// Whether visited entries advance the finished counter.
    #[must_use]
    pub fn counts_progress(self) -> bool {
        !matches!(self, Self::MoveCleanup)
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::Trash => write!(f, "trash"),
            Self::MoveCleanup => write!(f, "move-cleanup"),
        }
    }
}

/// A user-initiated operation: ordered roots, a kind, and a cancel token.
///
/// Everything but the token is fixed at construction.
#[derive(Debug, Clone)]
pub struct OperationRequest {
    kind: OperationKind,
    paths: Vec<PathBuf>,
    cancel: CancelToken,
}

impl OperationRequest {
    /// Create a request with a fresh cancel token.
    #[must_use]
    pub fn new(kind: OperationKind, paths: Vec<PathBuf>) -> Self {
        Self {
            kind,
            paths,
            cancel: CancelToken::new(),
        }
    }

    /// Use an externally owned cancel token (e.g. the Ctrl+C token).
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Operation kind.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Roots, in submission order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// The token the worker polls.
    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

/// Errors raised while processing entries.
///
/// Each one is reported to the observer where it happens; the walker then
/// unwinds with [`Halt::Failed`].
#[derive(thiserror::Error, Debug)]
pub enum OpError {
    /// Metadata lookup failed.
    #[error("cannot inspect {path}: {source}")]
    Query {
        /// Entry being inspected
        path: PathBuf,
        /// Filesystem failure
        #[source]
        source: FsError,
    },

    /// Directory listing failed, at open time or mid-walk.
    #[error("cannot list {path}: {source}")]
    Enumerate {
        /// Directory being listed
        path: PathBuf,
        /// Filesystem failure
        #[source]
        source: FsError,
    },

    /// Terminal removal failed.
    #[error("cannot delete {path}: {source}")]
    Delete {
        /// Entry being removed
        path: PathBuf,
        /// Filesystem failure
        #[source]
        source: FsError,
    },

    /// The entry cannot be trashed on its filesystem; it is queued for
    /// permanent deletion instead.
    #[error("cannot move {path} to trash: {message}")]
    TrashUnsupported {
        /// Root that could not be trashed
        path: PathBuf,
        /// Why the trash is unavailable
        message: String,
    },

    /// Trashing failed for any other reason. Aborts the trash batch.
    #[error("cannot move {path} to trash: {source}")]
    Trash {
        /// Root that could not be trashed
        path: PathBuf,
        /// Filesystem failure
        #[source]
        source: FsError,
    },
}

impl OpError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Query { path, .. }
            | Self::Enumerate { path, .. }
            | Self::Delete { path, .. }
            | Self::TrashUnsupported { path, .. }
            | Self::Trash { path, .. } => path,
        }
    }
}

/// Why a step stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The cancel token was observed set.
    Cancelled,
    /// An error was reported and the step gave up.
    Failed,
}

/// Outcome of processing one entry.
pub type StepResult = Result<(), Halt>;

/// Why a root could not be trashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// No trash support for this entry; eligible for fallback deletion.
    Unsupported,
    /// Any other failure.
    Other,
}

/// A root that the trash phase could not handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    /// Root path
    pub path: PathBuf,
    /// Classified cause
    pub cause: FailureCause,
    /// Human-readable description
    pub message: String,
}
