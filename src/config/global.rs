//! Global user configuration.
//!
//! The configuration file is optional. When present it is TOML:
//!
//! ```toml
//! # Where the resource store lives (defaults to the platform data dir)
//! repo_path = "~/ai-resources"
//!
//! [install]
//! # Tools used when a project has no tool directories and no manifest targets
//! targets = ["claude", "opencode"]
//! ```
//!
//! # Configuration File Location
//!
//! - `$AIMGR_CONFIG` when set
//! - otherwise `<config dir>/aimgr/config.toml` (`~/.config/aimgr/config.toml`
//!   on Linux)
//!
//! # Repository Location
//!
//! [`GlobalConfig::resolve_repo_path`] picks the first of:
//!
//! 1. `$AIMGR_REPO_PATH`
//! 2. `repo_path` from the config file
//! 3. `<data dir>/aimgr/repo`
//!
//! `~` and environment variables are expanded in both user-supplied forms.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{CONFIG_PATH_ENV, REPO_PATH_ENV};
use crate::core::AimgrError;
use crate::tools::{Tool, parse_tools};
use crate::utils::expand_path;
use crate::utils::fs::{read_toml_file, write_toml_file};

fn default_targets() -> Vec<String> {
    vec![Tool::Claude.name().to_string()]
}

/// `[install]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSettings {
    /// Tool names used when nothing else selects targets.
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            targets: default_targets(),
        }
    }
}

/// Global configuration structure for aimgr.
///
/// # Examples
///
/// ```rust,no_run
/// use aimgr::config::GlobalConfig;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = GlobalConfig::load()?;
/// let repo = config.resolve_repo_path()?;
/// println!("Repository: {}", repo.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Store location; may contain `~` or environment variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_path: Option<PathBuf>,

    #[serde(default)]
    pub install: InstallSettings,
}

impl GlobalConfig {
    /// Load from the default location. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            debug!("No config file at {}; using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from `path`, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Self = read_toml_file(path).map_err(|e| AimgrError::ConfigError {
            message: format!("Failed to load {}: {e:#}", path.display()),
        })?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        write_toml_file(path, self)
            .with_context(|| format!("Failed to write global config to {}", path.display()))
    }

    /// Path of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if `$AIMGR_CONFIG` cannot be expanded or the platform
    /// has no config directory.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(raw) = std::env::var(CONFIG_PATH_ENV)
            && !raw.is_empty()
        {
            return expand_path(&raw);
        }

        let dir = dirs::config_dir().ok_or_else(|| AimgrError::ConfigError {
            message: "Unable to determine config directory".to_string(),
        })?;
        Ok(dir.join("aimgr").join("config.toml"))
    }

    /// Configured default install targets.
    pub fn default_targets(&self) -> Result<Vec<Tool>> {
        let tools = parse_tools(&self.install.targets).map_err(|e| AimgrError::ConfigError {
            message: format!("Invalid install.targets: {e}"),
        })?;
        if tools.is_empty() {
            return Err(AimgrError::ConfigError {
                message: "install.targets must name at least one tool".to_string(),
            }
            .into());
        }
        Ok(tools)
    }

    /// Store location: `$AIMGR_REPO_PATH`, then `repo_path`, then the data dir.
    pub fn resolve_repo_path(&self) -> Result<PathBuf> {
        if let Ok(raw) = std::env::var(REPO_PATH_ENV)
            && !raw.is_empty()
        {
            return expand_path(&raw);
        }

        if let Some(configured) = &self.repo_path {
            return expand_path(&configured.to_string_lossy());
        }

        let data = dirs::data_dir().ok_or_else(|| AimgrError::ConfigError {
            message: "Unable to determine data directory; set repo_path or AIMGR_REPO_PATH".to_string(),
        })?;
        Ok(data.join("aimgr").join("repo"))
    }

    fn validate(&self) -> Result<()> {
        self.default_targets().map(|_| ())
    }
}
