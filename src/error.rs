//! Structured error handling and exit codes.

use serde::Serialize;

use crate::ops::JobReport;

/// Exit codes for sweeper.
///
/// - 0: Success (every item deleted or trashed)
/// - 1: General error (bad arguments, configuration, declined confirmation)
/// - 2: Operation failed (an item could not be processed)
/// - 3: Partial success (items the trash refused were left in place)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: every item was processed.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Operation failed: the job stopped on an error.
    OperationFailed = 2,
    /// Partial success: some items could not be trashed and were kept.
    PartialSuccess = 3,
    /// Interrupted: the job was cancelled by the user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "SW000",
            Self::GeneralError => "SW001",
            Self::OperationFailed => "SW002",
            Self::PartialSuccess => "SW003",
            Self::Interrupted => "SW130",
        }
    }

    /// Map a finished job to its exit code.
    #[must_use]
    pub fn from_report(report: &JobReport) -> Self {
        if report.cancelled {
            Self::Interrupted
        } else if !report.success {
            Self::OperationFailed
        } else if !report.pending_fallback().is_empty() {
            Self::PartialSuccess
        } else {
            Self::Success
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "SW001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
