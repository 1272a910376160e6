//! Filesystem access layer.
//!
//! The deletion engine never touches `std::fs` directly. It talks to a
//! [`FileSystem`] implementation through four primitives (query, enumerate,
//! delete, trash) so that the traversal logic can be exercised against a
//! scripted filesystem in tests and against [`LocalFs`] in production.
//!
//! # Architecture
//!
//! - [`local`]: `std::fs` + `trash` crate backend
//!
//! Errors are classified once, at this boundary, into [`FsError`]. In
//! particular a trash attempt that the platform cannot honour is reported
//! as [`FsError::Unsupported`]; nothing above this layer inspects raw OS
//! codes.

pub mod local;

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

pub use local::LocalFs;

/// Type of a filesystem entry, as seen without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory (must be emptied before removal)
    Directory,
    /// Symbolic link (removed, never followed)
    Symlink,
    /// Sockets, fifos, device nodes
    Other,
}

impl EntryKind {
    /// Classify a `std::fs::FileType` obtained without following symlinks.
    #[must_use]
    pub fn from_file_type(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }

    /// Whether the walker has to descend into this entry.
    #[must_use]
    pub fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// Minimal metadata needed to pick a traversal strategy and report progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Entry type
    pub kind: EntryKind,
    /// Raw file name
    pub name: OsString,
    /// Human-readable name (lossy UTF-8, NFC-normalized)
    pub display_name: String,
}

impl EntryInfo {
    /// Build entry info, deriving the display name from `name`.
    #[must_use]
    pub fn new(kind: EntryKind, name: impl Into<OsString>) -> Self {
        let name = name.into();
        let display_name = display_name(&name);
        Self {
            kind,
            name,
            display_name,
        }
    }

    /// Build entry info for `path`, using the path itself when it has no
    /// file name component (filesystem roots, `..`).
    #[must_use]
    pub fn for_path(kind: EntryKind, path: &Path) -> Self {
        let name = path
            .file_name()
            .map_or_else(|| path.as_os_str().to_os_string(), ToOwned::to_owned);
        Self::new(kind, name)
    }
}

/// A filesystem location plus optional cached metadata.
///
/// Directory enumeration fills in `info` for children; roots submitted by the
/// caller usually start without it and are inspected lazily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Location of the entry
    pub path: PathBuf,
    /// Cached metadata, if already known
    pub info: Option<EntryInfo>,
}

impl FileEntry {
    /// Create an entry with no cached metadata.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            info: None,
        }
    }

    /// Create an entry whose metadata is already known.
    #[must_use]
    pub fn with_info(path: impl Into<PathBuf>, info: EntryInfo) -> Self {
        Self {
            path: path.into(),
            info: Some(info),
        }
    }
}

/// Lossy, NFC-normalized rendering of a file name for display.
#[must_use]
pub fn display_name(name: &std::ffi::OsStr) -> String {
    name.to_string_lossy().nfc().collect()
}

/// Errors raised by the filesystem layer.
#[derive(thiserror::Error, Debug)]
pub enum FsError {
    /// The entry does not exist (vanished, or already removed).
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The operation is not supported for this entry or its filesystem.
    #[error("operation not supported for {path}: {message}")]
    Unsupported {
        /// Entry the operation was attempted on
        path: PathBuf,
        /// Platform description
        message: String,
    },

    /// Any other I/O failure.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A failure reported by the trash backend that carries no I/O error.
    #[error("trash failed for {path}: {message}")]
    Trash {
        /// Entry that could not be trashed
        path: PathBuf,
        /// Backend description
        message: String,
    },
}

impl FsError {
    /// Map an `io::Error` for `path` into the matching variant.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::Unsupported => Self::Unsupported {
                path: path.to_path_buf(),
                message: error.to_string(),
            },
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Unsupported { path: p, .. }
            | Self::Io { path: p, .. }
            | Self::Trash { path: p, .. } => p,
        }
    }

    /// Whether this error means "the platform cannot do that here".
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Iterator over the children of a directory.
pub type Children<'a> = Box<dyn Iterator<Item = Result<FileEntry, FsError>> + 'a>;

/// Primitives the deletion engine needs from a filesystem.
///
/// None of these follow symbolic links. Implementations must be shareable
/// with the worker thread of a job.
pub trait FileSystem: Send + Sync {
    /// Retrieve type, name and display name of `path`.
    ///
    /// # Errors
    ///
    /// Fails if the entry vanished, is not accessible, or the lookup failed.
    fn query_info(&self, path: &Path) -> Result<EntryInfo, FsError>;

    /// List the children of a directory, with metadata filled in.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be opened. Failures while reading
    /// individual entries are yielded by the iterator.
    fn enumerate_children(&self, path: &Path) -> Result<Children<'_>, FsError>;

    /// Permanently remove a file, symlink, or empty directory.
    ///
    /// # Errors
    ///
    /// Fails if the entry cannot be removed (including a non-empty directory).
    fn delete(&self, path: &Path, kind: EntryKind) -> Result<(), FsError>;

    /// Move an entry (and its whole subtree) to the trash.
    ///
    /// # Errors
    ///
    /// [`FsError::Unsupported`] when the filesystem holding `path` has no
    /// usable trash; any other variant for every other failure.
    fn trash(&self, path: &Path) -> Result<(), FsError>;

    /// Whether `path` already lives inside a trash directory.
    fn is_in_trash(&self, _path: &Path) -> bool {
        false
    }
}
