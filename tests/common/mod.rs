//! Shared test doubles: a scripted in-memory filesystem and a recording
//! observer.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use sweeper::count::DeepCounter;
use sweeper::fs::{Children, EntryInfo, EntryKind, FileEntry, FileSystem, FsError};
use sweeper::ops::{FileOpsJob, JobReport, OpError, OperationKind, OperationRequest};
use sweeper::progress::{JobObserver, Phase, ProgressUpdate};
use sweeper::signal::CancelToken;

/// A filesystem primitive invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Query(PathBuf),
    Enumerate(PathBuf),
    Delete(PathBuf),
    Trash(PathBuf),
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<PathBuf, EntryKind>,
    calls: Vec<Call>,
    fail_query: HashSet<PathBuf>,
    fail_enumerate: HashSet<PathBuf>,
    enumerate_error_after: HashMap<PathBuf, usize>,
    fail_delete: HashSet<PathBuf>,
    trash_unsupported: HashSet<PathBuf>,
    fail_trash: HashSet<PathBuf>,
    in_trash: HashSet<PathBuf>,
    cancel_after_deletes: Option<(usize, CancelToken)>,
    deletes: usize,
}

/// In-memory tree with fault injection. Children are listed in path order.
#[derive(Default)]
pub struct MemFs {
    state: Mutex<State>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(self, path: &str, kind: EntryKind) -> Self {
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(PathBuf::from(path), kind);
        self
    }

    pub fn dir(self, path: &str) -> Self {
        self.add(path, EntryKind::Directory)
    }

    pub fn file(self, path: &str) -> Self {
        self.add(path, EntryKind::File)
    }

    pub fn symlink(self, path: &str) -> Self {
        self.add(path, EntryKind::Symlink)
    }

    pub fn fail_query(self, path: &str) -> Self {
        self.state.lock().unwrap().fail_query.insert(path.into());
        self
    }

    pub fn fail_enumerate(self, path: &str) -> Self {
        self.state.lock().unwrap().fail_enumerate.insert(path.into());
        self
    }

    /// Yield an error after `count` children of `path`.
    pub fn enumerate_error_after(self, path: &str, count: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .enumerate_error_after
            .insert(path.into(), count);
        self
    }

    pub fn fail_delete(self, path: &str) -> Self {
        self.state.lock().unwrap().fail_delete.insert(path.into());
        self
    }

    pub fn trash_unsupported(self, path: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .trash_unsupported
            .insert(path.into());
        self
    }

    pub fn fail_trash(self, path: &str) -> Self {
        self.state.lock().unwrap().fail_trash.insert(path.into());
        self
    }

    pub fn in_trash(self, path: &str) -> Self {
        self.state.lock().unwrap().in_trash.insert(path.into());
        self
    }

    /// Cancel `token` right after the `count`-th successful delete.
    pub fn cancel_after_deletes(self, count: usize, token: CancelToken) -> Self {
        self.state.lock().unwrap().cancel_after_deletes = Some((count, token));
        self
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .nodes
            .contains_key(Path::new(path))
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().nodes.len()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn deleted(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn trashed(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Trash(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    fn denied(path: &Path) -> FsError {
        FsError::PermissionDenied(path.to_path_buf())
    }
}

fn info(path: &Path, kind: EntryKind) -> EntryInfo {
    EntryInfo::for_path(kind, path)
}

impl FileSystem for MemFs {
    fn query_info(&self, path: &Path) -> Result<EntryInfo, FsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Query(path.to_path_buf()));
        if state.fail_query.contains(path) {
            return Err(Self::denied(path));
        }
        match state.nodes.get(path) {
            Some(kind) => Ok(info(path, *kind)),
            None => Err(FsError::NotFound(path.to_path_buf())),
        }
    }

    fn enumerate_children(&self, path: &Path) -> Result<Children<'_>, FsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Enumerate(path.to_path_buf()));
        if state.fail_enumerate.contains(path) {
            return Err(Self::denied(path));
        }

        let mut children: Vec<Result<FileEntry, FsError>> = state
            .nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(path))
            .map(|(child, kind)| Ok(FileEntry::with_info(child.clone(), info(child, *kind))))
            .collect();

        if let Some(&after) = state.enumerate_error_after.get(path) {
            children.truncate(after);
            children.push(Err(FsError::Io {
                path: path.to_path_buf(),
                source: io::Error::other("directory changed while reading"),
            }));
        }

        Ok(Box::new(children.into_iter()))
    }

    fn delete(&self, path: &Path, kind: EntryKind) -> Result<(), FsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(path.to_path_buf()));
        if state.fail_delete.contains(path) {
            return Err(Self::denied(path));
        }
        if !state.nodes.contains_key(path) {
            return Err(FsError::NotFound(path.to_path_buf()));
        }
        if kind.is_dir() && state.nodes.keys().any(|p| p.parent() == Some(path)) {
            return Err(FsError::Io {
                path: path.to_path_buf(),
                source: io::Error::other("directory not empty"),
            });
        }

        state.nodes.remove(path);
        state.deletes += 1;
        let deletes = state.deletes;
        if let Some((after, token)) = &state.cancel_after_deletes {
            if deletes == *after {
                token.cancel();
            }
        }
        Ok(())
    }

    fn trash(&self, path: &Path) -> Result<(), FsError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Trash(path.to_path_buf()));
        if state.trash_unsupported.contains(path) {
            return Err(FsError::Unsupported {
                path: path.to_path_buf(),
                message: "no trash on this volume".to_string(),
            });
        }
        if state.fail_trash.contains(path) {
            return Err(FsError::Trash {
                path: path.to_path_buf(),
                message: "trash backend failed".to_string(),
            });
        }
        if !state.nodes.contains_key(path) {
            return Err(FsError::NotFound(path.to_path_buf()));
        }
        state.nodes.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn is_in_trash(&self, path: &Path) -> bool {
        self.state.lock().unwrap().in_trash.contains(path)
    }
}

impl DeepCounter for MemFs {
    fn count(&self, paths: &[PathBuf], _cancel: &CancelToken) -> u64 {
        let state = self.state.lock().unwrap();
        paths
            .iter()
            .map(|root| state.nodes.keys().filter(|p| p.starts_with(root)).count() as u64)
            .sum()
    }
}

/// Counter that always returns the same estimate.
pub struct FixedCounter(pub u64);

impl DeepCounter for FixedCounter {
    fn count(&self, _paths: &[PathBuf], _cancel: &CancelToken) -> u64 {
        self.0
    }
}

/// An observer notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Phase(Phase, u64),
    Current(String),
    Percent(ProgressUpdate),
    Error { path: PathBuf, fatal: bool },
    Confirm(Vec<PathBuf>),
    Finished { success: bool, cancelled: bool },
}

/// Observer that records every notification.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
    approve_fallback: bool,
    errors: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn approving() -> Arc<Self> {
        Arc::new(Self {
            approve_fallback: true,
            ..Self::default()
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn percents(&self) -> Vec<ProgressUpdate> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Percent(update) => Some(update),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(PathBuf, bool)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Error { path, fatal } => Some((path, fatal)),
                _ => None,
            })
            .collect()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn phases(&self) -> Vec<(Phase, u64)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Phase(phase, total) => Some((phase, total)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl JobObserver for RecordingObserver {
    fn on_phase_start(&self, phase: Phase, total: u64) {
        self.push(Event::Phase(phase, total));
    }

    fn on_current_file(&self, name: &str) {
        self.push(Event::Current(name.to_string()));
    }

    fn on_percent(&self, update: ProgressUpdate) {
        self.push(Event::Percent(update));
    }

    fn on_error(&self, error: &OpError, fatal: bool) {
        self.errors.lock().unwrap().push(error.to_string());
        self.push(Event::Error {
            path: error.path().to_path_buf(),
            fatal,
        });
    }

    fn confirm_fallback(&self, paths: &[PathBuf]) -> bool {
        self.push(Event::Confirm(paths.to_vec()));
        self.approve_fallback
    }

    fn on_finished(&self, report: &JobReport) {
        self.push(Event::Finished {
            success: report.success,
            cancelled: report.cancelled,
        });
    }
}

pub fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

/// A job over `fs`, counted by `fs`, observed by `observer`.
pub fn job(
    kind: OperationKind,
    roots: &[&str],
    fs: &Arc<MemFs>,
    observer: &Arc<RecordingObserver>,
) -> FileOpsJob {
    job_with_token(kind, roots, fs, observer, CancelToken::new())
}

pub fn job_with_token(
    kind: OperationKind,
    roots: &[&str],
    fs: &Arc<MemFs>,
    observer: &Arc<RecordingObserver>,
    cancel: CancelToken,
) -> FileOpsJob {
    let request = OperationRequest::new(kind, paths(roots)).with_cancel_token(cancel);
    FileOpsJob::new(request)
        .with_filesystem(fs.clone())
        .with_counter(fs.clone())
        .with_observer(observer.clone())
}
