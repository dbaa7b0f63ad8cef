//! Command-line interface for aimgr.
//!
//! Each command lives in its own module with its argument struct and an
//! `execute` method taking the shared [`CliConfig`]. Commands are thin: they
//! resolve selectors, take the repository lock when they mutate, call into the
//! library and print the outcome.
//!
//! # Available Commands
//!
//! ## Repository
//! - `repo import` - Add resources and packages to the store
//! - `repo list` - List stored resources and packages
//! - `repo remove` - Remove resources and packages from the store
//! - `repo verify` - Check store payloads against their metadata
//!
//! ## Project
//! - `install` - Link resources into tool directories and record them in `ai.package.yaml`
//! - `uninstall` - Remove links and manifest entries
//! - `list` - Show installed resources
//! - `verify` - Check links and manifest consistency
//! - `repair` - Fix verification issues, unmanaged files and stale manifest entries
//! - `clean` - Remove every store link from the project
//!
//! # Batch Semantics
//!
//! Commands taking several selectors keep going past individual failures and
//! exit non-zero only when nothing succeeded.
//!
//! # Examples
//!
//! ```bash
//! aimgr repo import ~/my-resources
//! aimgr install 'skill/pdf*' command/api/deploy
//! aimgr verify --format json
//! aimgr repair --reset --dry-run
//! ```

pub mod clean;
pub mod common;
pub mod install;
pub mod list;
pub mod repair;
pub mod repo;
pub mod uninstall;
pub mod verify;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Settings derived from global flags, passed to every command.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter when `RUST_LOG` is unset; `None` disables logging.
    pub log_level: Option<String>,
    /// Explicit config file (otherwise `$AIMGR_CONFIG` or the default location).
    pub config_path: Option<PathBuf>,
    /// Explicit repository root.
    pub repo_path: Option<PathBuf>,
    /// Explicit project directory.
    pub project_dir: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// `RUST_LOG` wins over the level chosen by flags. Calling this twice is harmless.
    pub fn init_logging(&self) {
        let filter = match (std::env::var("RUST_LOG"), &self.log_level) {
            (Ok(env), _) if !env.is_empty() => EnvFilter::new(env),
            (_, Some(level)) => EnvFilter::new(level),
            (_, None) => EnvFilter::new("off"),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// aimgr - manage AI resources for coding tools.
#[derive(Parser)]
#[command(
    name = "aimgr",
    about = "AI resource manager - store commands, skills and agents once, link them into every tool",
    version,
    long_about = "aimgr keeps commands, skills and agents in one repository and installs them into \
                  Claude Code, OpenCode and GitHub Copilot directories as symbolic links."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Repository location (overrides AIMGR_REPO_PATH and the config file).
    #[arg(long, global = true, value_name = "PATH")]
    repo: Option<PathBuf>,

    /// Path to a config file (overrides AIMGR_CONFIG).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Project directory (defaults to the current directory).
    #[arg(short = 'C', long = "project", global = true, value_name = "DIR")]
    project: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the resource repository.
    Repo(repo::RepoCommand),

    /// Install resources or packages into the project.
    ///
    /// Without selectors, installs everything declared in ai.package.yaml.
    Install(install::InstallCommand),

    /// Remove installed resources or packages from the project.
    Uninstall(uninstall::UninstallCommand),

    /// List resources installed in the project.
    List(list::ListCommand),

    /// Check installed links and ai.package.yaml for problems.
    Verify(verify::VerifyCommand),

    /// Fix problems found by verify.
    Repair(repair::RepairCommand),

    /// Remove every repository link from the project.
    Clean(clean::CleanCommand),
}

impl Cli {
    /// Execute with a configuration built from the parsed flags.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(&config)
    }

    /// Translate global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
            repo_path: self.repo.clone(),
            project_dir: self.project.clone(),
        }
    }

    /// Dispatch to the subcommand.
    pub fn execute_with_config(self, config: &CliConfig) -> Result<()> {
        match self.command {
            Commands::Repo(cmd) => cmd.execute(config),
            Commands::Install(cmd) => cmd.execute(config),
            Commands::Uninstall(cmd) => cmd.execute(config),
            Commands::List(cmd) => cmd.execute(config),
            Commands::Verify(cmd) => cmd.execute(config),
            Commands::Repair(cmd) => cmd.execute(config),
            Commands::Clean(cmd) => cmd.execute(config),
        }
    }
}
