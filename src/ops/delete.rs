//! Terminal removal of a single entry.
//!
//! Callers must only pass directories whose children have all been removed;
//! [`remove`] performs one `rmdir`/`unlink` and nothing else.

use std::path::Path;

use crate::fs::{EntryInfo, FileSystem};

use super::OpError;

/// Permanently remove one file, symlink, or empty directory.
///
/// # Errors
///
/// [`OpError::Delete`] if the filesystem refuses the removal.
pub fn remove(fs: &dyn FileSystem, path: &Path, info: &EntryInfo) -> Result<(), OpError> {
    fs.delete(path, info.kind).map_err(|source| {
        log::debug!("Delete failed for {}: {}", path.display(), source);
        OpError::Delete {
            path: path.to_path_buf(),
            source,
        }
    })?;

    log::trace!("Deleted {:?} {}", info.kind, path.display());
    Ok(())
}
