//! Project verification.
//!
//! Three read-only passes over a project, merged into one [`VerifyReport`]:
//!
//! 1. **Link scan**: every entry of every supported kind directory of every
//!    tool is checked. Unreadable and dangling links are errors, links whose
//!    target lies outside the store are `wrong-repo` warnings. Regular files
//!    and directories are ignored here (see [`crate::repair::reset`]).
//! 2. **Manifest sync**: every reference in `ai.package.yaml` must be present
//!    in at least one tool supporting its kind. A resource no detected tool
//!    can hold counts as not installed. A package with missing
//!    members yields a single `partial-package` issue, or one `not-installed`
//!    issue per member in [`VerifyMode::Repair`].
//! 3. **Orphans**: store links whose resource the manifest does not declare,
//!    directly or through a package.
//!
//! Passes 2 and 3 only run when the project has a manifest. Issues are data:
//! verification fails only when the project cannot be read.

pub mod issue;

pub use issue::{Issue, IssueKind, IssueSubject, Severity, merge_issues};

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::{ResourceId, ResourceKind};
use crate::installer::{EntryType, ScannedEntry, scan_kind_dir};
use crate::manifest::Manifest;
use crate::repository::Repository;
use crate::resource::Reference;
use crate::tools::Tool;
use crate::utils::fs::target_text_under_root;

/// How declared packages are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    /// One `partial-package` issue per incomplete package.
    Report,
    /// Packages expanded into `not-installed` issues for their members.
    Repair,
}

/// Result of [`Verifier::verify`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    issues: Vec<Issue>,
}

impl VerifyReport {
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

/// Checks a project's tool directories against the store and manifest.
#[derive(Debug, Clone)]
pub struct Verifier {
    project: PathBuf,
    store_root: PathBuf,
    tools: Vec<Tool>,
}

impl Verifier {
    pub fn new(project: impl Into<PathBuf>, store_root: impl Into<PathBuf>, tools: Vec<Tool>) -> Self {
        Self {
            project: project.into(),
            store_root: store_root.into(),
            tools,
        }
    }

    /// Run every pass. No tools means nothing to verify.
    pub fn verify(&self, repo: &Repository, mode: VerifyMode) -> Result<VerifyReport> {
        if self.tools.is_empty() {
            debug!("No tools detected in {}; nothing to verify", self.project.display());
            return Ok(VerifyReport::default());
        }

        let entries = self.scan()?;
        let scan_issues = self.link_issues(&entries);

        let manifest_path = Manifest::path_in(&self.project);
        let mut manifest_issues = Vec::new();
        if Manifest::exists(&manifest_path) {
            let manifest = Manifest::load(&manifest_path)?;
            let declared = self.sync_issues(repo, &manifest, &manifest_path, mode, &mut manifest_issues);
            manifest_issues.extend(self.orphan_issues(&entries, &declared));
        }

        let issues = merge_issues(scan_issues, manifest_issues);
        debug!("Verification of {} found {} issue(s)", self.project.display(), issues.len());
        Ok(VerifyReport { issues })
    }

    fn scan(&self) -> Result<Vec<(Tool, ScannedEntry)>> {
        let mut entries = Vec::new();
        for &tool in &self.tools {
            for kind in tool.supported_kinds() {
                let Some(dir) = tool.kind_dir(&self.project, kind) else {
                    continue;
                };
                let scanned = scan_kind_dir(&dir, kind)
                    .with_context(|| format!("Failed to scan {} for {tool}", dir.display()))?;
                entries.extend(scanned.into_iter().map(|e| (tool, e)));
            }
        }
        Ok(entries)
    }

    fn link_issues(&self, entries: &[(Tool, ScannedEntry)]) -> Vec<Issue> {
        let mut issues = Vec::new();
        for (tool, entry) in entries {
            let subject = IssueSubject::Resource(ResourceId::new(entry.kind, entry.name.clone()));
            match &entry.entry {
                EntryType::UnreadableLink(reason) => issues.push(Issue::new(
                    subject,
                    tool.name(),
                    IssueKind::Unreadable,
                    format!("Cannot read symlink: {reason}"),
                    &entry.path,
                )),
                EntryType::Link(target) if !entry.resolves() => issues.push(Issue::new(
                    subject,
                    tool.name(),
                    IssueKind::Broken,
                    format!("Symlink target does not exist: {}", target.display()),
                    &entry.path,
                )),
                EntryType::Link(target) if !target_text_under_root(target, &self.store_root) => {
                    issues.push(Issue::new(
                        subject,
                        tool.name(),
                        IssueKind::WrongRepo,
                        format!(
                            "Symlink points to {} instead of the repository at {}",
                            target.display(),
                            self.store_root.display()
                        ),
                        &entry.path,
                    ));
                }
                _ => {}
            }
        }
        issues
    }

    /// Check every manifest reference; returns the resources the manifest declares.
    fn sync_issues(
        &self,
        repo: &Repository,
        manifest: &Manifest,
        manifest_path: &Path,
        mode: VerifyMode,
        issues: &mut Vec<Issue>,
    ) -> HashSet<ResourceId> {
        let mut declared = HashSet::new();

        for (reference, parsed) in manifest.references() {
            match parsed {
                Ok(Reference::Resource(id)) => {
                    if !self.is_present(&id) {
                        issues.push(Issue::manifest(
                            IssueSubject::Resource(id.clone()),
                            IssueKind::NotInstalled,
                            format!("Declared in manifest but not installed: {reference}"),
                            manifest_path,
                        ));
                    }
                    declared.insert(id);
                }
                Ok(Reference::Package(name)) => {
                    let package = match repo.get_package(&name) {
                        Ok(package) => package,
                        Err(e) => {
                            issues.push(Issue::manifest(
                                IssueSubject::Package(name.clone()),
                                IssueKind::NotInstalled,
                                format!("Package cannot be loaded from repository: {e}"),
                                manifest_path,
                            ));
                            continue;
                        }
                    };

                    let members: Vec<ResourceId> =
                        package.members().into_iter().filter_map(|(_, id)| id.ok()).collect();
                    let missing: Vec<&ResourceId> = members
                        .iter()
                        .filter(|id| !self.is_present(id))
                        .collect();

                    match mode {
                        VerifyMode::Report if !missing.is_empty() => {
                            let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
                            issues.push(Issue::manifest(
                                IssueSubject::Package(name.clone()),
                                IssueKind::PartialPackage,
                                format!(
                                    "Package '{name}' has {} of {} resources not installed: {}",
                                    missing.len(),
                                    members.len(),
                                    names.join(", ")
                                ),
                                manifest_path,
                            ));
                        }
                        VerifyMode::Repair => {
                            for id in missing {
                                issues.push(Issue::manifest(
                                    IssueSubject::Resource(id.clone()),
                                    IssueKind::NotInstalled,
                                    format!("Member of package '{name}' not installed: {id}"),
                                    manifest_path,
                                ));
                            }
                        }
                        VerifyMode::Report => {}
                    }
                    declared.extend(members);
                }
                // Manifest::load already rejects malformed references
                Err(_) => {}
            }
        }

        declared
    }

    fn orphan_issues(&self, entries: &[(Tool, ScannedEntry)], declared: &HashSet<ResourceId>) -> Vec<Issue> {
        entries
            .iter()
            .filter(|(_, entry)| {
                entry
                    .link_target()
                    .is_some_and(|target| entry.resolves() && target_text_under_root(target, &self.store_root))
            })
            .filter_map(|(tool, entry)| {
                let id = ResourceId::new(entry.kind, entry.name.clone());
                (!declared.contains(&id)).then(|| {
                    Issue::new(
                        IssueSubject::Resource(id.clone()),
                        tool.name(),
                        IssueKind::Orphaned,
                        format!("Installed but not declared in manifest: {id}"),
                        &entry.path,
                    )
                })
            })
            .collect()
    }

    /// Whether anything sits at `id`'s location in a tool supporting its kind.
    fn is_present(&self, id: &ResourceId) -> bool {
        self.tools.iter().filter_map(|tool| tool.kind_dir(&self.project, id.kind)).any(|dir| {
            fs::symlink_metadata(id.kind.entry_path(&dir, &id.name)).is_ok()
                || (id.kind == ResourceKind::Command && dir.join(&id.name).is_dir())
        })
    }
}
