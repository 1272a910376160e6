//! End-to-end runs of the CLI entry point against a temporary directory.
//!
//! Only `delete` is exercised here; `trash` would touch the real trash.

use std::fs;
use std::path::Path;

use clap::Parser;
use sweeper::cli::Cli;
use sweeper::error::ExitCode;
use tempfile::tempdir;

fn cli(dir: &Path, args: &[&str]) -> Cli {
    // Point at a config file that does not exist so the user's settings
    // cannot leak into the test
    let config = dir.join("no-config.toml");
    let mut argv = vec![
        "sweeper".to_string(),
        "--quiet".to_string(),
        "--config".to_string(),
        config.display().to_string(),
    ];
    argv.extend(args.iter().map(ToString::to_string));
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn test_delete_tree_succeeds() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("build");
    fs::create_dir_all(target.join("obj/deep")).unwrap();
    fs::write(target.join("obj/deep/a.o"), b"obj").unwrap();
    fs::write(target.join("out.bin"), b"bin").unwrap();

    let cli = cli(
        dir.path(),
        &["delete", "--yes", "--output", "json", target.to_str().unwrap()],
    );
    let code = sweeper::run_app(cli).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(!target.exists());
}

#[test]
fn test_delete_missing_path_fails() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");
    let kept = dir.path().join("kept.txt");
    fs::write(&kept, b"x").unwrap();

    let cli = cli(
        dir.path(),
        &[
            "delete",
            "--yes",
            missing.to_str().unwrap(),
            kept.to_str().unwrap(),
        ],
    );
    let code = sweeper::run_app(cli).unwrap();

    assert_eq!(code, ExitCode::OperationFailed);
    assert!(kept.exists());
}

#[test]
fn test_invalid_config_file_is_an_error() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "fallback = \"sometimes\"").unwrap();
    let target = dir.path().join("a.txt");
    fs::write(&target, b"x").unwrap();

    let cli = Cli::try_parse_from([
        "sweeper",
        "--quiet",
        "--config",
        config.to_str().unwrap(),
        "delete",
        "--yes",
        target.to_str().unwrap(),
    ])
    .unwrap();

    assert!(sweeper::run_app(cli).is_err());
    assert!(target.exists());
}
