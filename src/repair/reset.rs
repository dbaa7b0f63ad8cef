//! Removing unmanaged entries from tool directories.
//!
//! An entry is unmanaged when it is not a link into the store: a regular file,
//! a directory (for commands: below a namespace), a link pointing elsewhere,
//! or a link that cannot be read. Valid store links are never touched.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::{ResourceId, ResourceKind};
use crate::installer::{EntryType, scan_kind_dir};
use crate::tools::Tool;
use crate::utils::fs::{prune_empty_dirs, remove_dir_all, target_text_under_root};
use crate::verify::{Issue, IssueKind, IssueSubject};

/// Why an entry counts as unmanaged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "reason", content = "target")]
pub enum UnmanagedReason {
    File,
    Dir,
    ForeignLink(PathBuf),
    UnreadableLink,
}

/// An entry in a tool kind directory not owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmanagedEntry {
    pub tool: Tool,
    pub kind: ResourceKind,
    pub name: String,
    pub path: PathBuf,
    pub reason: UnmanagedReason,
    /// Kind directory the entry lives in
    #[serde(skip)]
    pub kind_dir: PathBuf,
}

impl UnmanagedEntry {
    /// The entry as a verification issue.
    #[must_use]
    pub fn to_issue(&self) -> Issue {
        let description = match &self.reason {
            UnmanagedReason::File => "Regular file, not managed by aimgr".to_string(),
            UnmanagedReason::Dir => "Directory, not managed by aimgr".to_string(),
            UnmanagedReason::ForeignLink(target) => {
                format!("Symlink points outside the repository: {}", target.display())
            }
            UnmanagedReason::UnreadableLink => "Symlink target cannot be read".to_string(),
        };
        Issue::new(
            IssueSubject::Resource(ResourceId::new(self.kind, self.name.clone())),
            self.tool.name(),
            IssueKind::Unmanaged,
            description,
            &self.path,
        )
    }
}

/// Asks the user for a yes/no decision.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// How [`reset`] proceeds.
pub enum ResetMode<'a> {
    /// Report what would be removed.
    DryRun,
    /// Remove without asking.
    Force,
    /// Ask once before removing everything.
    Interactive(&'a mut dyn Confirm),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResetReport {
    pub removed: Vec<PathBuf>,
    pub would_remove: Vec<PathBuf>,
    /// `(path, reason)`
    pub failed: Vec<(PathBuf, String)>,
    /// Interactive confirmation was declined
    pub cancelled: bool,
}

/// Find unmanaged entries in every supported kind directory of `tools`.
pub fn find_unmanaged(project: &Path, tools: &[Tool], store_root: &Path) -> Result<Vec<UnmanagedEntry>> {
    let mut unmanaged = Vec::new();

    for &tool in tools {
        for kind in tool.supported_kinds() {
            let Some(dir) = tool.kind_dir(project, kind) else {
                continue;
            };
            for entry in scan_kind_dir(&dir, kind)? {
                let reason = match entry.entry {
                    EntryType::File => UnmanagedReason::File,
                    EntryType::Dir => UnmanagedReason::Dir,
                    EntryType::UnreadableLink(_) => UnmanagedReason::UnreadableLink,
                    EntryType::Link(target) if !target_text_under_root(&target, store_root) => {
                        UnmanagedReason::ForeignLink(target)
                    }
                    EntryType::Link(_) => continue,
                };
                unmanaged.push(UnmanagedEntry {
                    tool,
                    kind,
                    name: entry.name,
                    path: entry.path,
                    reason,
                    kind_dir: dir.clone(),
                });
            }
        }
    }

    Ok(unmanaged)
}

/// Remove `unmanaged` entries according to `mode`.
///
/// Directories are removed recursively; namespace directories left empty are
/// removed afterwards. Individual failures are collected.
pub fn reset(unmanaged: &[UnmanagedEntry], mode: ResetMode<'_>) -> Result<ResetReport> {
    let mut report = ResetReport::default();
    if unmanaged.is_empty() {
        return Ok(report);
    }

    match mode {
        ResetMode::DryRun => {
            report.would_remove = unmanaged.iter().map(|e| e.path.clone()).collect();
            return Ok(report);
        }
        ResetMode::Interactive(confirm) => {
            let prompt = format!("Remove all {} unmanaged file(s)?", unmanaged.len());
            if !confirm.confirm(&prompt)? {
                report.cancelled = true;
                return Ok(report);
            }
        }
        ResetMode::Force => {}
    }

    for entry in unmanaged {
        match remove_entry(&entry.path) {
            Ok(()) => {
                info!("Removed unmanaged {}", entry.path.display());
                report.removed.push(entry.path.clone());
            }
            Err(e) => {
                warn!("Failed to remove {}: {e:#}", entry.path.display());
                report.failed.push((entry.path.clone(), format!("{e:#}")));
            }
        }
    }

    for entry in unmanaged {
        if let Some(parent) = entry.path.parent() {
            prune_empty_dirs(parent, &entry.kind_dir);
        }
    }

    Ok(report)
}

fn remove_entry(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path).with_context(|| format!("Failed to stat {}", path.display()))?;
    if meta.is_dir() {
        remove_dir_all(path)
    } else {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))
    }
}
