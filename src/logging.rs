//! Logging setup using the `log` facade and the `env_logger` backend.
//!
//! Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: warn level
//!
//! Only this crate logs at the chosen level; dependencies stay at `warn`.
//! Per-item errors reach the user through the progress observer, so the
//! default level keeps the log quiet.
//!
//! # Example
//!
//! ```rust,no_run
//! use sweeper::logging::init_logging;
//!
//! // -v: debug output from sweeper
//! init_logging(1, false);
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize logging. Panics if a logger is already installed.
pub fn init_logging(verbose: u8, quiet: bool) {
    build(verbose, quiet).init();
    log::debug!("Logging initialized at level: {:?}", determine_level(verbose, quiet));
}

/// Initialize logging unless a logger is already installed.
///
/// Returns `false` if another logger was already set (e.g. a previous call
/// in the same test process).
pub fn try_init_logging(verbose: u8, quiet: bool) -> bool {
    build(verbose, quiet).try_init().is_ok()
}

fn build(verbose: u8, quiet: bool) -> Builder {
    let mut builder = Builder::new();

    if env::var_os("RUST_LOG").is_some() {
        builder.parse_default_env();
    } else {
        builder
            .filter_level(LevelFilter::Warn)
            .filter_module(env!("CARGO_CRATE_NAME"), determine_level(verbose, quiet));
    }

    configure_format(&mut builder, verbose);
    builder
}

/// Map CLI flags to this crate's level.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} [{}] {}",
                    buf.timestamp_millis(),
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} {}",
                    buf.timestamp_seconds(),
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        });
    }
}
