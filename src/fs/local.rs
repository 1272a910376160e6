//! Local filesystem backend using `std::fs` and the `trash` crate.

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;

use super::{Children, EntryInfo, EntryKind, FileEntry, FileSystem, FsError};

/// OS error codes that mean the trash cannot be used for an entry.
#[cfg(windows)]
const UNSUPPORTED_OS_CODES: &[i32] = &[
    50, // ERROR_NOT_SUPPORTED
];
#[cfg(target_os = "macos")]
const UNSUPPORTED_OS_CODES: &[i32] = &[
    18,  // EXDEV
    45,  // ENOTSUP
    102, // EOPNOTSUPP
];
#[cfg(all(unix, not(target_os = "macos")))]
const UNSUPPORTED_OS_CODES: &[i32] = &[
    18, // EXDEV
    95, // EOPNOTSUPP / ENOTSUP
];
#[cfg(not(any(unix, windows)))]
const UNSUPPORTED_OS_CODES: &[i32] = &[];

/// Filesystem backend for the local machine.
///
/// # Example
///
/// ```no_run
/// use sweeper::fs::{FileSystem, LocalFs};
/// use std::path::Path;
///
/// let fs = LocalFs::new();
/// let info = fs.query_info(Path::new("/tmp")).unwrap();
/// println!("{:?}", info.kind);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocalFs {
    trash_dirs: Vec<PathBuf>,
}

impl LocalFs {
    /// Create a backend that knows the current user's trash location.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trash_dirs: default_trash_dirs(),
        }
    }

    /// Create a backend with an explicit list of trash directories.
    #[must_use]
    pub fn with_trash_dirs(trash_dirs: Vec<PathBuf>) -> Self {
        Self { trash_dirs }
    }
}

fn default_trash_dirs() -> Vec<PathBuf> {
    let Some(base) = BaseDirs::new() else {
        return Vec::new();
    };

    #[cfg(target_os = "macos")]
    let dirs = vec![base.home_dir().join(".Trash")];
    #[cfg(not(target_os = "macos"))]
    let dirs = vec![base.data_dir().join("Trash")];

    dirs
}

fn is_uid(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

/// Whether an ancestor of `path` is a per-volume trash directory:
/// `.Trash-<uid>`, `.Trash/<uid>` or `$Recycle.Bin`.
///
/// Only ancestors count; the entry's own name never does.
fn under_volume_trash(path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return false;
    };
    let names: Vec<_> = parent
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();

    names.iter().enumerate().any(|(i, name)| {
        name.strip_prefix(".Trash-").is_some_and(is_uid)
            || name.eq_ignore_ascii_case("$Recycle.Bin")
            || (name == ".Trash" && names.get(i + 1).is_some_and(|next| is_uid(next)))
    })
}

/// `path` with its parent resolved, leaving the final component as is.
fn resolve_parent(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => fs::canonicalize(parent)
            .map_or_else(|_| path.to_path_buf(), |parent| parent.join(name)),
        _ => path.to_path_buf(),
    }
}

fn classify_trash_error(path: &Path, error: trash::Error) -> FsError {
    match error {
        trash::Error::Os { code, description } if UNSUPPORTED_OS_CODES.contains(&code) => {
            FsError::Unsupported {
                path: path.to_path_buf(),
                message: description,
            }
        }
        #[cfg(all(
            unix,
            not(target_os = "macos"),
            not(target_os = "ios"),
            not(target_os = "android")
        ))]
        trash::Error::FileSystem { source, .. }
            if source
                .raw_os_error()
                .is_some_and(|code| UNSUPPORTED_OS_CODES.contains(&code))
                || source.kind() == std::io::ErrorKind::Unsupported =>
        {
            FsError::Unsupported {
                path: path.to_path_buf(),
                message: source.to_string(),
            }
        }
        other => FsError::Trash {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    }
}

impl FileSystem for LocalFs {
    fn query_info(&self, path: &Path) -> Result<EntryInfo, FsError> {
        let metadata = fs::symlink_metadata(path).map_err(|e| FsError::from_io(path, e))?;
        Ok(EntryInfo::for_path(
            EntryKind::from_file_type(metadata.file_type()),
            path,
        ))
    }

    fn enumerate_children(&self, path: &Path) -> Result<Children<'_>, FsError> {
        let read_dir = fs::read_dir(path).map_err(|e| FsError::from_io(path, e))?;
        let parent = path.to_path_buf();

        Ok(Box::new(read_dir.map(move |entry| {
            let entry = entry.map_err(|e| FsError::from_io(&parent, e))?;
            let child = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|e| FsError::from_io(&child, e))?;
            let info = EntryInfo::new(EntryKind::from_file_type(file_type), entry.file_name());
            Ok(FileEntry::with_info(child, info))
        })))
    }

    fn delete(&self, path: &Path, kind: EntryKind) -> Result<(), FsError> {
        let result = match kind {
            EntryKind::Directory => fs::remove_dir(path),
            // Directory symlinks on Windows are removed like directories
            #[cfg(windows)]
            EntryKind::Symlink => fs::remove_file(path).or_else(|_| fs::remove_dir(path)),
            _ => fs::remove_file(path),
        };
        result.map_err(|e| FsError::from_io(path, e))
    }

    fn trash(&self, path: &Path) -> Result<(), FsError> {
        fs::symlink_metadata(path).map_err(|e| FsError::from_io(path, e))?;

        trash::delete(path).map_err(|e| {
            let error = classify_trash_error(path, e);
            log::debug!("Trash failed for {}: {}", path.display(), error);
            error
        })
    }

    fn is_in_trash(&self, path: &Path) -> bool {
        let path = resolve_parent(path);
        let inside = |dir: &Path| path.starts_with(dir) && path != dir;

        self.trash_dirs.iter().any(|dir| {
            inside(dir.as_path()) || fs::canonicalize(dir).is_ok_and(|resolved| inside(&resolved))
        }) || under_volume_trash(&path)
    }
}
