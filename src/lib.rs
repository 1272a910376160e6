//! sweeper - cancellable bulk delete and move-to-trash
//!
//! A job takes an ordered list of paths and either deletes them permanently
//! (depth-first, children before their parent) or moves them to the trash,
//! offering permanent deletion for items whose filesystem has no trash.
//! Progress, the current file, and errors are published to a
//! [`progress::JobObserver`] while the job runs on its own worker thread.

pub mod cli;
pub mod config;
pub mod count;
pub mod error;
pub mod fs;
pub mod logging;
pub mod ops;
pub mod progress;
pub mod signal;

use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::Config;
use crate::error::ExitCode;
use crate::ops::{FileOpsJob, OperationKind, OperationRequest};
use crate::progress::Progress;

/// Run the command described by `cli` and map the outcome to an exit code.
///
/// # Errors
///
/// Fails on invalid configuration, a declined or impossible delete
/// confirmation, or if the worker thread cannot be run. Per-item failures
/// are not errors here; they show up in the returned [`ExitCode`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::try_init_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => Config::try_load_from_path(path)
            .with_context(|| format!("Invalid configuration file {}", path.display()))?,
        None => Config::load(),
    };
    config.merge_cli(&cli);
    log::debug!("Effective configuration: {:?}", config);

    if cli.no_color || config.accessible {
        yansi::disable();
    }

    let common = cli.command.common();
    let kind = match &cli.command {
        Commands::Delete(_) => OperationKind::Delete,
        Commands::Trash(_) => OperationKind::Trash,
    };

    if kind == OperationKind::Delete && !common.yes {
        confirm_delete(&common.paths)?;
    }

    let cancel = signal::install_handler()?;
    let observer = Progress::with_accessible(cli.quiet, config.accessible)
        .with_bar(config.progress)
        .with_assume_yes(common.yes);

    let request = OperationRequest::new(kind, common.paths.clone()).with_cancel_token(cancel);
    let handle = FileOpsJob::new(request)
        .with_observer(Arc::new(observer))
        .with_fallback_policy(config.fallback)
        .spawn()?;
    let report = handle.join()?;

    match common.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", report.summary());
            }
        }
    }

    Ok(ExitCode::from_report(&report))
}

/// Ask before deleting permanently. Refuses when stdin is not a terminal.
fn confirm_delete(paths: &[PathBuf]) -> Result<()> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        bail!("Refusing to delete permanently without --yes in non-interactive mode");
    }

    let mut stderr = std::io::stderr();
    write!(
        stderr,
        "Permanently delete {} item(s)? This cannot be undone. [y/N] ",
        paths.len()
    )?;
    stderr.flush()?;

    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
        bail!("Deletion cancelled by user");
    }
    Ok(())
}
