//! Move-to-trash: failure partitioning and the permanent-delete fallback.

use std::path::PathBuf;
use std::sync::Arc;

use sweeper::error::ExitCode;
use sweeper::ops::{FallbackPolicy, OperationKind};
use sweeper::progress::Phase;

use crate::common::{job, paths, Call, Event, MemFs, RecordingObserver};

fn abc() -> MemFs {
    MemFs::new()
        .file("/a")
        .dir("/b")
        .file("/b/inner")
        .file("/c")
        .trash_unsupported("/b")
}

#[test]
fn test_trash_all_supported() {
    let fs = Arc::new(MemFs::new().file("/a").dir("/d").file("/d/f"));
    let observer = RecordingObserver::new();

    let report = job(OperationKind::Trash, &["/a", "/d"], &fs, &observer).run();

    assert!(report.success);
    assert_eq!(report.trashed, 2);
    assert_eq!(report.total, 2);
    assert!(report.fallback.is_empty());
    assert_eq!(fs.trashed(), paths(&["/a", "/d"]));
    // Trash acts on whole subtrees; nothing is enumerated
    assert!(!fs.calls().iter().any(|c| matches!(c, Call::Enumerate(_))));
    assert_eq!(fs.len(), 0);
    assert_eq!(observer.percents().last().map(|u| u.percent), Some(100));
    assert_eq!(ExitCode::from_report(&report), ExitCode::Success);
}

#[test]
fn test_unsupported_root_declined_stays_in_place() {
    let fs = Arc::new(abc());
    let observer = RecordingObserver::new();

    let report = job(OperationKind::Trash, &["/a", "/b", "/c"], &fs, &observer)
        .with_fallback_policy(FallbackPolicy::Never)
        .run();

    assert!(report.success);
    assert_eq!(report.trashed, 2);
    assert_eq!(report.fallback, paths(&["/b"]));
    assert!(!report.fallback_applied);
    assert_eq!(fs.trashed(), paths(&["/a", "/b", "/c"]));
    assert!(fs.exists("/b/inner"));
    assert!(fs.deleted().is_empty());
    assert_eq!(observer.errors(), vec![(PathBuf::from("/b"), false)]);
    assert!(!observer.events().iter().any(|e| matches!(e, Event::Confirm(_))));
    assert_eq!(ExitCode::from_report(&report), ExitCode::PartialSuccess);
}

#[test]
fn test_unsupported_root_deleted_with_always_policy() {
    let fs = Arc::new(abc());
    let observer = RecordingObserver::new();

    let report = job(OperationKind::Trash, &["/a", "/b", "/c"], &fs, &observer)
        .with_fallback_policy(FallbackPolicy::Always)
        .run();

    assert!(report.success);
    assert!(report.fallback_applied);
    assert_eq!(report.removed, 2);
    assert_eq!(fs.deleted(), paths(&["/b/inner", "/b"]));
    assert_eq!(fs.len(), 0);
    assert_eq!(
        observer.phases(),
        vec![(Phase::Trash, 3), (Phase::Fallback, 2)]
    );
    assert_eq!(ExitCode::from_report(&report), ExitCode::Success);
}

#[test]
fn test_ask_policy_consults_observer() {
    let fs = Arc::new(abc());
    let observer = RecordingObserver::approving();

    let report = job(OperationKind::Trash, &["/a", "/b", "/c"], &fs, &observer).run();

    assert!(report.fallback_applied);
    assert!(observer
        .events()
        .contains(&Event::Confirm(paths(&["/b"]))));
    assert!(!fs.exists("/b"));
}

#[test]
fn test_ask_policy_declined() {
    let fs = Arc::new(abc());
    let observer = RecordingObserver::new();

    let report = job(OperationKind::Trash, &["/a", "/b", "/c"], &fs, &observer).run();

    assert!(report.success);
    assert!(!report.fallback_applied);
    assert!(fs.exists("/b"));
    assert!(report.summary().contains("1 item(s) left in place"));
}

#[test]
fn test_other_trash_failure_aborts_batch() {
    let fs = Arc::new(
        MemFs::new()
            .file("/a")
            .file("/b")
            .file("/c")
            .fail_trash("/b"),
    );
    let observer = RecordingObserver::approving();

    let report = job(OperationKind::Trash, &["/a", "/b", "/c"], &fs, &observer).run();

    assert!(!report.success);
    assert_eq!(report.trashed, 1);
    assert!(report.fallback.is_empty());
    assert_eq!(fs.trashed(), paths(&["/a", "/b"]));
    assert!(fs.exists("/c"));
    assert_eq!(observer.errors(), vec![(PathBuf::from("/b"), true)]);
    assert!(!observer.events().iter().any(|e| matches!(e, Event::Confirm(_))));
    assert_eq!(ExitCode::from_report(&report), ExitCode::OperationFailed);
}

#[test]
fn test_mixed_batch_with_generic_failure() {
    let fs = Arc::new(abc().fail_trash("/c"));
    let observer = RecordingObserver::approving();

    let report = job(OperationKind::Trash, &["/a", "/b", "/c"], &fs, &observer)
        .with_fallback_policy(FallbackPolicy::Always)
        .run();

    assert!(!report.success);
    assert_eq!(report.trashed, 1);
    assert_eq!(report.fallback, paths(&["/b"]));
    assert!(!report.fallback_applied);
    assert!(!fs.exists("/a"));
    assert!(fs.exists("/b"));
    assert!(fs.exists("/c"));
    assert_eq!(
        observer.errors(),
        vec![(PathBuf::from("/b"), false), (PathBuf::from("/c"), true)]
    );
}

#[test]
fn test_fatal_failure_after_unsupported_skips_fallback() {
    let fs = Arc::new(
        MemFs::new()
            .file("/a")
            .file("/b")
            .trash_unsupported("/a")
            .fail_trash("/b"),
    );
    let observer = RecordingObserver::approving();

    let report = job(OperationKind::Trash, &["/a", "/b"], &fs, &observer)
        .with_fallback_policy(FallbackPolicy::Always)
        .run();

    assert!(!report.success);
    assert!(!report.fallback_applied);
    assert!(fs.exists("/a"));
    assert!(fs.deleted().is_empty());
}

#[test]
fn test_already_trashed_goes_to_fallback_without_trash_call() {
    let fs = Arc::new(MemFs::new().file("/t").in_trash("/t"));
    let observer = RecordingObserver::new();

    let report = job(OperationKind::Trash, &["/t"], &fs, &observer)
        .with_fallback_policy(FallbackPolicy::Always)
        .run();

    assert!(report.success);
    assert!(fs.trashed().is_empty());
    assert_eq!(fs.deleted(), paths(&["/t"]));
    assert!(observer.error_messages()[0].contains("already in the trash"));
}

#[test]
fn test_fallback_resets_progress_baseline() {
    let fs = Arc::new(abc());
    let observer = RecordingObserver::new();

    let job = job(OperationKind::Trash, &["/a", "/b", "/c"], &fs, &observer)
        .with_fallback_policy(FallbackPolicy::Never);
    let progress = job.progress();
    let _ = job.run();

    // After the trash loop the baseline is the number of fallback roots
    assert_eq!(progress.total(), 1);
    assert_eq!(progress.finished(), 0);
    let last = observer.percents().last().copied().unwrap();
    assert_eq!((last.finished, last.total), (0, 1));
}
