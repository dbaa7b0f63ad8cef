//! Configuration for aimgr.
//!
//! aimgr has a single, optional, user-wide configuration file; per-project
//! settings live in the project manifest (`ai.package.yaml`, see
//! [`crate::manifest`]).
//!
//! # Precedence
//!
//! | setting          | highest                | then                 | default                |
//! |------------------|------------------------|----------------------|------------------------|
//! | repository path  | `--repo` flag          | `$AIMGR_REPO_PATH`, `repo_path` | `<data dir>/aimgr/repo` |
//! | install targets  | `--target` flag        | existing tool dirs, manifest `install.targets`, `install.targets` | `["claude"]` |
//!
//! # Examples
//!
//! ```rust,no_run
//! use aimgr::config::GlobalConfig;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = GlobalConfig::load()?;
//! let targets = config.default_targets()?;
//! println!("Default targets: {targets:?}");
//! # Ok(())
//! # }
//! ```

mod global;

pub use global::{GlobalConfig, InstallSettings};
