//! Application configuration management.
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory (or `--config FILE`)
//! 3. `SWEEPER_*` environment variables
//! 4. Command-line flags, applied with [`Config::merge_cli`]
//!
//! # Example
//!
//! ```toml
//! # ~/.config/sweeper/config.toml
//! fallback = "never"
//! progress = true
//! accessible = false
//! ```

use anyhow::Result;
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::{Cli, Commands};
use crate::ops::FallbackPolicy;

/// Prefix of environment variables read by [`Config::load`].
pub const ENV_PREFIX: &str = "SWEEPER_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// What to do with items that cannot be moved to the trash
    pub fallback: FallbackPolicy,
    /// Draw a progress bar
    pub progress: bool,
    /// ASCII-only, colorless output for screen readers
    pub accessible: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback: FallbackPolicy::Ask,
            progress: true,
            accessible: false,
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_from_path(path),
            Err(e) => {
                log::debug!("No config directory, using defaults: {}", e);
                Self::load_from_figment(Self::figment(None))
            }
        }
    }

    /// Load the configuration from `path`, falling back to defaults on error.
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        Self::load_from_figment(Self::figment(Some(path.as_ref())))
    }

    /// Load the configuration from `path`, reporting malformed sources.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns the figment error if a source cannot be parsed.
    pub fn try_load_from_path(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Self::figment(Some(path.as_ref())).extract()
    }

    fn load_from_figment(figment: Figment) -> Self {
        match figment.extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Apply command-line overrides.
    pub fn merge_cli(&mut self, cli: &Cli) {
        let common = match &cli.command {
            Commands::Delete(args) => &args.common,
            Commands::Trash(args) => {
                if let Some(fallback) = args.fallback {
                    self.fallback = fallback;
                }
                &args.common
            }
        };

        if common.no_progress || cli.quiet {
            self.progress = false;
        }
        if common.accessible {
            self.accessible = true;
        }
    }

    /// Get the default platform-specific configuration path.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "sweeper", "sweeper")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
