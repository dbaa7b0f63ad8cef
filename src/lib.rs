//! aimgr - AI resource manager
//!
//! Keeps AI coding-tool resources (commands, skills and agents) in one local
//! repository and installs them into projects as symbolic links, so a single
//! copy serves Claude Code, OpenCode and GitHub Copilot alike.
//!
//! # Architecture Overview
//!
//! - The **repository** holds canonical payloads under `commands/`, `skills/`
//!   and `agents/`, package definitions under `packages/`, and one metadata
//!   record per item under `.metadata/`.
//! - A project's **manifest** (`ai.package.yaml`) lists the references it
//!   wants installed (`skill/pdf`, `command/api/deploy`, `package/web`).
//! - The **installer** creates links from each tool's directories into the
//!   repository; it never copies and never touches entries it does not own.
//! - The **verifier** compares links and the manifest and reports issues;
//!   the **repairer** fixes what it can and explains the rest.
//!
//! # Core Modules
//!
//! - [`core`] - Error types, resource kinds and identities
//! - [`resource`] - Resource loading, name validation, packages and references
//! - [`pattern`] - Glob selectors over resources and packages
//! - [`metadata`] - Per-item metadata records
//! - [`repository`] - The resource store, bulk import, integrity checks, locking
//! - [`tools`] - Tool descriptors and directory layout
//! - [`manifest`] - `ai.package.yaml` parsing and editing
//! - [`installer`] - Link creation, removal and inspection
//! - [`verify`] - Consistency issues between links, manifest and store
//! - [`repair`] - Fixing issues, resetting unmanaged files, pruning the manifest
//! - [`config`] - Global configuration (`~/.config/aimgr/config.toml`)
//! - [`cli`] - Command-line front end
//! - [`utils`] - Filesystem helpers (atomic writes, links, directory pruning)
//!
//! # Example
//!
//! ```no_run
//! use aimgr::core::{ResourceId, ResourceKind};
//! use aimgr::installer::Installer;
//! use aimgr::repository::Repository;
//! use aimgr::tools::Tool;
//!
//! # fn main() -> anyhow::Result<()> {
//! let repo = Repository::new("/home/me/.local/share/aimgr/repo");
//! let installer = Installer::new("/home/me/project", vec![Tool::Claude]);
//! installer.install(&repo, &ResourceId::new(ResourceKind::Skill, "pdf"))?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod installer;
pub mod manifest;
pub mod metadata;
pub mod pattern;
pub mod repair;
pub mod repository;
pub mod resource;
pub mod tools;
pub mod utils;
pub mod verify;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
