//! Cooperative cancellation and Ctrl+C handling.
//!
//! A [`CancelToken`] wraps an `AtomicBool` that can be shared across threads.
//! The job that owns a token may set it at any time; the worker polls it at
//! well-defined checkpoints (top of every recursive step, around every child
//! iteration, before every top-level entry) and unwinds once it reads `true`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use sweeper::signal::install_handler;
//!
//! // Ctrl+C now cancels the token
//! let token = install_handler().expect("Failed to install signal handler");
//!
//! if token.is_cancelled() {
//!     println!("Cancelled, stopping...");
//! }
//! ```
//!
//! # Exit Codes
//!
//! When a signal is received:
//! - The token is cancelled
//! - A message "Interrupted. Stopping..." is printed to stderr
//! - The application should exit with code 130 (128 + SIGINT)

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Exit code for SIGINT (Ctrl+C) interruption.
/// This follows Unix convention: 128 + signal number (SIGINT = 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared cancellation signal for a running job.
///
/// Cloning a token shares the underlying flag, so a clone handed to a worker
/// thread observes `cancel()` calls made through any other clone.
///
/// # Example
///
/// ```
/// use sweeper::signal::CancelToken;
///
/// let token = CancelToken::new();
/// let worker_token = token.clone();
///
/// token.cancel();
/// assert!(worker_token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Wrap an existing flag, e.g. one owned by a surrounding application.
    #[must_use]
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    /// Check whether cancellation has been requested. Never blocks.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag so the token can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Get a clone of the raw flag.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_TOKEN: Mutex<Option<CancelToken>> = Mutex::new(None);

/// Install a Ctrl+C handler that cancels the returned token.
///
/// The handler is process-wide. Calling this again (tests, repeated
/// `run_app` calls) resets and returns the token installed the first time.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the handler cannot be registered,
/// for example because another handler already owns the signal.
pub fn install_handler() -> Result<CancelToken, SignalError> {
    let mut global = GLOBAL_TOKEN.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(token) = global.as_ref() {
        token.reset();
        return Ok(token.clone());
    }

    let token = CancelToken::new();
    let flag = token.flag();

    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);

        let _ = writeln!(std::io::stderr(), "\nInterrupted. Stopping...");
        let _ = std::io::stderr().flush();

        log::info!("Cancellation signal received");
    })?;

    *global = Some(token.clone());
    Ok(token)
}
