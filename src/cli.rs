//! Command-line interface definitions for sweeper.
//!
//! # Example
//!
//! ```bash
//! # Move files to the trash, asking before deleting anything the trash refuses
//! sweeper trash ~/Downloads/old-build ~/Downloads/archive.zip
//!
//! # Permanently delete without prompting
//! sweeper delete --yes /tmp/scratch
//!
//! # Machine-readable report
//! sweeper trash --fallback never --output json /mnt/usb/photos
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::ops::FallbackPolicy;

/// Delete files or move them to the trash, with progress and cancellation.
#[derive(Debug, Parser)]
#[command(name = "sweeper")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE", env = "SWEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Permanently delete files and directories
    Delete(DeleteArgs),
    /// Move files and directories to the trash
    Trash(TrashArgs),
}

impl Commands {
    /// Options shared by every subcommand.
    #[must_use]
    pub fn common(&self) -> &CommonArgs {
        match self {
            Self::Delete(args) => &args.common,
            Self::Trash(args) => &args.common,
        }
    }
}

/// Options shared by `delete` and `trash`.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Files and directories to process, in order
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Skip confirmation prompts (required for delete in non-interactive mode)
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// ASCII-only output without colors, for screen readers
    #[arg(long)]
    pub accessible: bool,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the delete subcommand.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the trash subcommand.
#[derive(Debug, Args)]
pub struct TrashArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// What to do with items whose filesystem has no trash
    ///
    /// Defaults to the configured policy, or `ask`.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub fallback: Option<FallbackPolicy>,
}

/// Output format for the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One-line human-readable summary
    Text,
    /// JSON report for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
