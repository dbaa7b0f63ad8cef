//! Projecting stored resources into tool directories as symbolic links.
//!
//! An installation is a link at `<project>/<tool dir>/<entry>` whose absolute
//! target is the resource's payload in the store:
//!
//! ```text
//! .claude/commands/api/deploy.md -> <repo>/commands/api/deploy.md
//! .claude/skills/pdf             -> <repo>/skills/pdf
//! .github/skills/pdf             -> <repo>/skills/pdf
//! ```
//!
//! The installer only ever removes links that resolve into the store. Regular
//! files and directories in tool directories are never touched.
//!
//! # Target selection
//!
//! [`detect_install_targets`] picks the tools to install into, first match wins:
//!
//! 1. tools whose directories already exist in the project (all of them)
//! 2. `install.targets` of the project manifest
//! 3. the configured defaults
//!
//! # Submodules
//!
//! - [`package`]: installing and uninstalling every member of a package
//! - [`scan`]: reading tool kind directories, shared with verify and repair

pub mod package;
pub mod scan;

pub use package::{PackageInstallReport, PackageUninstallReport};
pub use scan::{EntryType, ScannedEntry, scan_kind_dir};

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::core::{AimgrError, ResourceId};
use crate::manifest::Manifest;
use crate::repository::Repository;
use crate::resource::validate_name_for;
use crate::tools::Tool;
use crate::utils::fs::{
    create_symlink, ensure_parent_dir, prune_empty_dirs, remove_symlink, resolves_under_root,
};

/// State of a path where an installation link is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkState {
    /// Nothing there.
    Absent,
    /// A link that resolves to a path under the store.
    Valid,
    /// A link whose target does not exist.
    Dangling,
    /// A link that resolves outside the store.
    ForeignStore,
    /// A regular file or directory.
    NotALink,
}

/// What [`ensure_valid_symlink`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkAction {
    Created,
    /// An existing link was removed and recreated; carries its previous state.
    Replaced(LinkState),
    Unchanged,
    /// A non-link occupies the path; nothing was done.
    Occupied,
}

/// Result of installing one resource into one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkOutcome {
    pub tool: Tool,
    pub path: PathBuf,
    pub action: LinkAction,
}

/// What uninstalling did at one tool location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnlinkAction {
    Removed,
    /// A regular file or directory; left in place.
    SkippedNotALink,
    /// A link that does not point into the store; left in place.
    SkippedForeign,
}

/// Result of uninstalling one resource from one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlinkOutcome {
    pub tool: Tool,
    pub path: PathBuf,
    pub action: UnlinkAction,
}

/// Whether an installed link still resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkHealth {
    Ok,
    Broken,
}

/// One store-owned link found in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledResource {
    pub id: ResourceId,
    pub tool: Tool,
    pub path: PathBuf,
    pub target: PathBuf,
    pub health: LinkHealth,
}

/// Classify the entry at `link` against `store_root`.
///
/// Errors only when the entry cannot be inspected at all.
pub fn inspect_link(link: &Path, store_root: &Path) -> Result<LinkState> {
    let meta = match fs::symlink_metadata(link) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LinkState::Absent),
        Err(e) => return Err(e).with_context(|| format!("Failed to inspect {}", link.display())),
    };

    if !meta.file_type().is_symlink() {
        return Ok(LinkState::NotALink);
    }

    let target = fs::read_link(link).with_context(|| format!("Failed to read link {}", link.display()))?;
    if fs::metadata(link).is_err() {
        return Ok(LinkState::Dangling);
    }

    if resolves_under_root(link, &target, store_root) {
        Ok(LinkState::Valid)
    } else {
        Ok(LinkState::ForeignStore)
    }
}

/// Make `link` a valid link to `expected`.
///
/// Absent: create. Valid: leave. Dangling or foreign: remove and recreate.
/// Not a link: report [`LinkAction::Occupied`] and leave it alone.
pub fn ensure_valid_symlink(link: &Path, expected: &Path, store_root: &Path) -> Result<LinkAction> {
    let state = inspect_link(link, store_root)?;
    let action = match state {
        LinkState::Valid => return Ok(LinkAction::Unchanged),
        LinkState::NotALink => {
            warn!("{} exists and is not a link; leaving it in place", link.display());
            return Ok(LinkAction::Occupied);
        }
        LinkState::Absent => LinkAction::Created,
        LinkState::Dangling | LinkState::ForeignStore => {
            debug!("Replacing {:?} link {}", state, link.display());
            remove_symlink(link)?;
            LinkAction::Replaced(state)
        }
    };

    ensure_parent_dir(link)?;
    create_symlink(expected, link)?;
    Ok(action)
}

/// Tools to install into for `project`.
///
/// A manifest that fails to load is ignored; unknown manifest targets are an error.
pub fn detect_install_targets(project: &Path, defaults: &[Tool]) -> Result<Vec<Tool>> {
    let existing = Tool::detect_existing(project);
    if !existing.is_empty() {
        return Ok(existing);
    }

    let manifest_path = Manifest::path_in(project);
    if Manifest::exists(&manifest_path) {
        match Manifest::load(&manifest_path) {
            Ok(manifest) if !manifest.install.targets.is_empty() => {
                return manifest
                    .target_tools()
                    .context("Invalid install.targets in manifest");
            }
            Ok(_) => {}
            Err(e) => warn!("Ignoring unreadable manifest {}: {e:#}", manifest_path.display()),
        }
    }

    Ok(defaults.to_vec())
}

/// Installs resources of one project into a set of tools.
#[derive(Debug, Clone)]
pub struct Installer {
    project: PathBuf,
    targets: Vec<Tool>,
}

impl Installer {
    /// Installer with explicit targets.
    pub fn new(project: impl Into<PathBuf>, targets: Vec<Tool>) -> Self {
        Self {
            project: project.into(),
            targets,
        }
    }

    /// Installer whose targets come from [`detect_install_targets`].
    pub fn for_project(project: impl Into<PathBuf>, defaults: &[Tool]) -> Result<Self> {
        let project = project.into();
        let targets = detect_install_targets(&project, defaults)?;
        debug!("Install targets for {}: {:?}", project.display(), targets);
        Ok(Self::new(project, targets))
    }

    #[must_use]
    pub fn project(&self) -> &Path {
        &self.project
    }

    #[must_use]
    pub fn targets(&self) -> &[Tool] {
        &self.targets
    }

    /// Where the link for `id` lives in `tool`, if the tool supports the kind.
    #[must_use]
    pub fn link_path(&self, tool: Tool, id: &ResourceId) -> Option<PathBuf> {
        tool.kind_dir(&self.project, id.kind).map(|dir| id.kind.entry_path(&dir, &id.name))
    }

    /// Link `id` into every target tool supporting its kind.
    pub fn install(&self, repo: &Repository, id: &ResourceId) -> Result<Vec<LinkOutcome>> {
        validate_name_for(id.kind, &id.name)?;
        if !repo.exists(id.kind, &id.name) {
            return Err(repo.not_found(id).into());
        }
        let expected = repo.path_for(id.kind, &id.name);

        let mut outcomes = Vec::new();
        for &tool in &self.targets {
            let Some(path) = self.link_path(tool, id) else {
                continue;
            };
            let action = ensure_valid_symlink(&path, &expected, repo.root())
                .with_context(|| format!("Failed to install {id} for {tool}"))?;
            if matches!(action, LinkAction::Created | LinkAction::Replaced(_)) {
                info!("Installed {id} for {tool} at {}", path.display());
            }
            outcomes.push(LinkOutcome {
                tool,
                path,
                action,
            });
        }
        Ok(outcomes)
    }

    /// Remove the links of `id` from every target tool.
    ///
    /// Only links resolving into the store are removed. When nothing was found
    /// at any location the resource is reported as not installed.
    pub fn uninstall(&self, repo: &Repository, id: &ResourceId) -> Result<Vec<UnlinkOutcome>> {
        validate_name_for(id.kind, &id.name)?;
        let mut outcomes = Vec::new();

        for &tool in &self.targets {
            let Some(path) = self.link_path(tool, id) else {
                continue;
            };
            let action = match inspect_link(&path, repo.root())? {
                LinkState::Absent => continue,
                LinkState::NotALink => UnlinkAction::SkippedNotALink,
                LinkState::ForeignStore => UnlinkAction::SkippedForeign,
                LinkState::Valid => {
                    self.remove_link(tool, id, &path)?;
                    UnlinkAction::Removed
                }
                LinkState::Dangling => {
                    let target = fs::read_link(&path).unwrap_or_default();
                    if resolves_under_root(&path, &target, repo.root()) {
                        self.remove_link(tool, id, &path)?;
                        UnlinkAction::Removed
                    } else {
                        UnlinkAction::SkippedForeign
                    }
                }
            };
            outcomes.push(UnlinkOutcome {
                tool,
                path,
                action,
            });
        }

        if outcomes.is_empty() {
            return Err(AimgrError::NotInstalled {
                id: id.to_string(),
            }
            .into());
        }
        Ok(outcomes)
    }

    fn remove_link(&self, tool: Tool, id: &ResourceId, path: &Path) -> Result<()> {
        remove_symlink(path)?;
        if let (Some(parent), Some(kind_dir)) = (path.parent(), tool.kind_dir(&self.project, id.kind)) {
            prune_empty_dirs(parent, &kind_dir);
        }
        info!("Uninstalled {id} from {tool}");
        Ok(())
    }

    /// Whether a resolving link for `id` exists in any target tool.
    #[must_use]
    pub fn is_installed(&self, id: &ResourceId) -> bool {
        self.targets.iter().filter_map(|&tool| self.link_path(tool, id)).any(|path| {
            fs::symlink_metadata(&path).is_ok_and(|m| m.file_type().is_symlink()) && fs::metadata(&path).is_ok()
        })
    }

    /// Store-owned links in every target tool, in tool then path order.
    pub fn list_installed(&self, repo: &Repository) -> Result<Vec<InstalledResource>> {
        let mut installed = Vec::new();
        for &tool in &self.targets {
            for kind in tool.supported_kinds() {
                let Some(dir) = tool.kind_dir(&self.project, kind) else {
                    continue;
                };
                for entry in scan_kind_dir(&dir, kind)? {
                    let Some(target) = entry.link_target() else {
                        continue;
                    };
                    if !resolves_under_root(&entry.path, target, repo.root()) {
                        continue;
                    }
                    let health = if entry.resolves() { LinkHealth::Ok } else { LinkHealth::Broken };
                    installed.push(InstalledResource {
                        id: ResourceId::new(kind, entry.name.clone()),
                        tool,
                        target: target.to_path_buf(),
                        path: entry.path,
                        health,
                    });
                }
            }
        }
        Ok(installed)
    }

    /// Remove every store-owned link in every target kind directory.
    ///
    /// Failures are logged and the sweep continues; returns the removed paths.
    pub fn clean(&self, repo: &Repository) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for installed in self.list_installed(repo)? {
            match remove_symlink(&installed.path) {
                Ok(()) => {
                    if let (Some(parent), Some(kind_dir)) =
                        (installed.path.parent(), installed.tool.kind_dir(&self.project, installed.id.kind))
                    {
                        prune_empty_dirs(parent, &kind_dir);
                    }
                    debug!("Removed {}", installed.path.display());
                    removed.push(installed.path);
                }
                Err(e) => warn!("Failed to remove {}: {e:#}", installed.path.display()),
            }
        }
        info!("Cleaned {} link(s) from {}", removed.len(), self.project.display());
        Ok(removed)
    }
}
