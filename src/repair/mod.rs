//! Fixing the issues found by [`crate::verify`].
//!
//! [`Repairer::repair`] works through an issue list and sorts every issue into
//! one of three buckets: fixed, failed or hint. Nothing is ever raised for a
//! single issue, so a batch always completes. Orphaned links are never
//! removed; the user gets the command to run instead.
//!
//! Two related reconciliations live in submodules:
//!
//! - [`reset`]: removing unmanaged entries (regular files, directories and
//!   foreign links) from tool directories
//! - [`prune`]: removing manifest references whose target left the store

pub mod prune;
pub mod reset;

pub use prune::{
    PartialPackage, PruneChoice, PruneChooser, PruneMode, PruneReport, find_invalid_refs, invalid_ref_issues, prune,
};
pub use reset::{Confirm, ResetMode, ResetReport, UnmanagedEntry, find_unmanaged, reset};

use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::constants::MANIFEST_FILE_NAME;
use crate::core::ResourceId;
use crate::installer::{Installer, LinkAction};
use crate::repository::Repository;
use crate::tools::Tool;
use crate::utils::fs::{is_symlink, remove_symlink};
use crate::verify::{Issue, IssueKind, IssueSubject};

/// One repair outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairAction {
    pub resource: String,
    pub tool: String,
    pub issue_type: IssueKind,
    pub description: String,
}

impl RepairAction {
    fn for_issue(issue: &Issue, description: impl Into<String>) -> Self {
        Self {
            resource: issue.subject.to_string(),
            tool: issue.tool.clone(),
            issue_type: issue.kind,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    pub fixed: usize,
    pub failed: usize,
    pub hints: usize,
}

/// Result of [`Repairer::repair`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairResult {
    pub fixed: Vec<RepairAction>,
    pub failed: Vec<RepairAction>,
    pub hints: Vec<RepairAction>,
    pub summary: RepairSummary,
}

impl RepairResult {
    fn finish(mut self) -> Self {
        self.summary = RepairSummary {
            fixed: self.fixed.len(),
            failed: self.failed.len(),
            hints: self.hints.len(),
        };
        self
    }
}

/// Applies fixes for verification issues in one project.
pub struct Repairer<'a> {
    project: PathBuf,
    repo: &'a Repository,
    tools: Vec<Tool>,
}

impl<'a> Repairer<'a> {
    pub fn new(project: impl Into<PathBuf>, repo: &'a Repository, tools: Vec<Tool>) -> Self {
        Self {
            project: project.into(),
            repo,
            tools,
        }
    }

    /// Repair every issue, collecting outcomes.
    pub fn repair(&self, issues: &[Issue]) -> RepairResult {
        let mut result = RepairResult::default();

        for issue in issues {
            debug!("Repairing {} ({}) for {}", issue.subject, issue.kind, issue.tool);
            match (issue.kind, &issue.subject) {
                (IssueKind::Broken | IssueKind::WrongRepo, IssueSubject::Resource(id)) => {
                    self.relink(issue, id, &mut result);
                }
                (IssueKind::NotInstalled, IssueSubject::Resource(id)) => {
                    self.install_missing(issue, id, &mut result);
                }
                (IssueKind::NotInstalled, IssueSubject::Package(name)) => {
                    result.hints.push(RepairAction::for_issue(
                        issue,
                        format!(
                            "Package '{name}' not found in repository. Run 'aimgr repair --prune-package' to remove it from {MANIFEST_FILE_NAME}"
                        ),
                    ));
                }
                (IssueKind::PartialPackage, subject) => {
                    result.hints.push(RepairAction::for_issue(
                        issue,
                        format!("Run 'aimgr install {subject}' to install its missing resources"),
                    ));
                }
                (IssueKind::Orphaned, subject) => {
                    result.hints.push(RepairAction::for_issue(
                        issue,
                        format!(
                            "Run 'aimgr uninstall {subject}' to remove, or run 'aimgr install {subject}' to add to {MANIFEST_FILE_NAME}"
                        ),
                    ));
                }
                (IssueKind::Unreadable, _) => {
                    result.failed.push(RepairAction::for_issue(
                        issue,
                        format!("Unreadable symlink at {}; manual intervention required", issue.path.display()),
                    ));
                }
                (IssueKind::Unmanaged, _) => {
                    result.hints.push(RepairAction::for_issue(
                        issue,
                        format!("Run 'aimgr repair --reset' to remove {}", issue.path.display()),
                    ));
                }
                (IssueKind::InvalidRef, _) => {
                    result.hints.push(RepairAction::for_issue(
                        issue,
                        format!("Run 'aimgr repair --prune-package' to remove it from {MANIFEST_FILE_NAME}"),
                    ));
                }
                (kind, subject) => {
                    result.failed.push(RepairAction::for_issue(
                        issue,
                        format!("Cannot repair {kind} for {subject}"),
                    ));
                }
            }
        }

        result.finish()
    }

    /// Remove the bad link and install afresh for the issue's tool.
    fn relink(&self, issue: &Issue, id: &ResourceId, result: &mut RepairResult) {
        if is_symlink(&issue.path)
            && let Err(e) = remove_symlink(&issue.path)
        {
            result.failed.push(RepairAction::for_issue(issue, format!("{e:#}")));
            return;
        }

        if !self.repo.exists(id.kind, &id.name) {
            result.failed.push(RepairAction::for_issue(
                issue,
                format!(
                    "Resource '{}' no longer exists in repository; consider removing it from {MANIFEST_FILE_NAME}",
                    id.name
                ),
            ));
            return;
        }

        let tools = match issue.tool.parse::<Tool>() {
            Ok(tool) => vec![tool],
            Err(_) => self.tools.clone(),
        };
        self.install_into(issue, id, tools, format!("Reinstalled {id}"), result);
    }

    fn install_missing(&self, issue: &Issue, id: &ResourceId, result: &mut RepairResult) {
        if !self.repo.exists(id.kind, &id.name) {
            result
                .failed
                .push(RepairAction::for_issue(issue, format!("Resource '{id}' not found in repository")));
            return;
        }
        self.install_into(issue, id, self.tools.clone(), format!("Installed {id}"), result);
    }

    fn install_into(&self, issue: &Issue, id: &ResourceId, tools: Vec<Tool>, success: String, result: &mut RepairResult) {
        let installer = Installer::new(&self.project, tools);
        match installer.install(self.repo, id) {
            Ok(outcomes) if outcomes.is_empty() => {
                result
                    .failed
                    .push(RepairAction::for_issue(issue, format!("No target tool supports {}s", id.kind)));
            }
            Ok(outcomes) if outcomes.iter().all(|o| o.action == LinkAction::Occupied) => {
                result.failed.push(RepairAction::for_issue(
                    issue,
                    "Target path is occupied by a file or directory",
                ));
            }
            Ok(_) => result.fixed.push(RepairAction::for_issue(issue, success)),
            Err(e) => {
                warn!("Failed to repair {id}: {e:#}");
                result.failed.push(RepairAction::for_issue(issue, format!("{e:#}")));
            }
        }
    }
}
