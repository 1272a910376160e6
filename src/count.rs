//! Deep count pre-pass.
//!
//! Before a delete job starts, every entry under the selected roots is
//! counted so that progress can be reported as a percentage. The count
//! includes the roots themselves and every directory, matching the number
//! of items the tree walker will visit.

use std::path::PathBuf;

use walkdir::WalkDir;

use crate::signal::CancelToken;

/// Estimates the total amount of work for a set of roots.
pub trait DeepCounter: Send + Sync {
    /// Count all entries under `paths`, roots included.
    ///
    /// Unreadable entries are skipped rather than failing the count; the
    /// result is an estimate used only for progress reporting.
    fn count(&self, paths: &[PathBuf], cancel: &CancelToken) -> u64;
}

/// [`DeepCounter`] backed by `walkdir`.
///
/// Symbolic links are counted as single entries and never followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkCounter;

impl DeepCounter for WalkCounter {
    fn count(&self, paths: &[PathBuf], cancel: &CancelToken) -> u64 {
        let mut total = 0u64;

        for root in paths {
            for entry in WalkDir::new(root).follow_links(false) {
                if cancel.is_cancelled() {
                    log::debug!("Deep count cancelled after {} entries", total);
                    return total;
                }
                match entry {
                    Ok(_) => total += 1,
                    Err(e) => log::trace!("Deep count skipped entry: {}", e),
                }
            }
        }

        total
    }
}
