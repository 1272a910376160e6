//! Entry inspection.

use std::path::{Path, PathBuf};

use crate::fs::{EntryInfo, FileEntry, FileSystem};

use super::OpError;

/// Look up type, name and display name of `path` without following symlinks.
///
/// # Errors
///
/// [`OpError::Query`] if the entry vanished, is not accessible, or the
/// lookup failed.
pub fn inspect(fs: &dyn FileSystem, path: &Path) -> Result<FileEntry, OpError> {
    let info = query(fs, path)?;
    Ok(FileEntry::with_info(path, info))
}

/// Split `entry` into its path and metadata, inspecting it first if the
/// metadata is not cached.
///
/// # Errors
///
/// Same as [`inspect`].
pub fn resolve(fs: &dyn FileSystem, entry: FileEntry) -> Result<(PathBuf, EntryInfo), OpError> {
    match entry.info {
        Some(info) => Ok((entry.path, info)),
        None => {
            let info = query(fs, &entry.path)?;
            Ok((entry.path, info))
        }
    }
}

fn query(fs: &dyn FileSystem, path: &Path) -> Result<EntryInfo, OpError> {
    fs.query_info(path).map_err(|source| OpError::Query {
        path: path.to_path_buf(),
        source,
    })
}
