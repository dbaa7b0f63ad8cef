//! Removing manifest references whose target is gone from the store.
//!
//! A reference is invalid when it cannot be parsed or names a resource or
//! package the store does not have. A package that exists but lists missing
//! members is only partial: it is reported and never pruned.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::manifest::Manifest;
use crate::repository::Repository;
use crate::resource::Reference;
use crate::verify::{Issue, IssueKind, IssueSubject};

/// A declared package with members missing from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialPackage {
    pub name: String,
    pub missing: Vec<String>,
}

/// Answer for one invalid reference in interactive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneChoice {
    Remove,
    Skip,
}

/// Decides per reference in interactive mode.
pub trait PruneChooser {
    fn choose(&mut self, reference: &str) -> Result<PruneChoice>;
}

pub enum PruneMode<'a> {
    /// Report what would be removed.
    DryRun,
    /// Remove every invalid reference.
    Force,
    /// Ask for every reference.
    Interactive(&'a mut dyn PruneChooser),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub removed: Vec<String>,
    pub would_remove: Vec<String>,
    pub skipped: Vec<String>,
    /// Whether the manifest file was rewritten
    pub saved: bool,
}

/// Split manifest references into invalid ones and partial packages.
pub fn find_invalid_refs(manifest: &Manifest, repo: &Repository) -> (Vec<String>, Vec<PartialPackage>) {
    let mut invalid = Vec::new();
    let mut partial = Vec::new();

    for (reference, parsed) in manifest.references() {
        match parsed {
            Err(_) => invalid.push(reference),
            Ok(Reference::Resource(id)) => {
                if !repo.exists(id.kind, &id.name) {
                    invalid.push(reference);
                }
            }
            Ok(Reference::Package(name)) => match repo.get_package(&name) {
                Err(_) => invalid.push(reference),
                Ok(package) => {
                    let missing = repo.missing_package_members(&package);
                    if !missing.is_empty() {
                        partial.push(PartialPackage { name, missing });
                    }
                }
            },
        }
    }

    (invalid, partial)
}

/// Invalid references as verification issues.
pub fn invalid_ref_issues(invalid: &[String], manifest_path: &Path) -> Vec<Issue> {
    invalid
        .iter()
        .map(|reference| {
            let subject = match Reference::parse(reference) {
                Ok(Reference::Resource(id)) => IssueSubject::Resource(id),
                Ok(Reference::Package(name)) => IssueSubject::Package(name),
                Err(_) => IssueSubject::Path(manifest_path.to_path_buf()),
            };
            Issue::manifest(
                subject,
                IssueKind::InvalidRef,
                format!("{reference} not found in repository"),
                manifest_path,
            )
        })
        .collect()
}

/// Remove `invalid` references from `manifest` according to `mode`.
///
/// The manifest is saved to `path` only when something was removed.
pub fn prune(manifest: &mut Manifest, path: &Path, invalid: &[String], mode: PruneMode<'_>) -> Result<PruneReport> {
    let mut report = PruneReport::default();

    match mode {
        PruneMode::DryRun => {
            report.would_remove = invalid.to_vec();
            return Ok(report);
        }
        PruneMode::Force => {
            for reference in invalid {
                if manifest.remove(reference) {
                    report.removed.push(reference.clone());
                }
            }
        }
        PruneMode::Interactive(chooser) => {
            for reference in invalid {
                match chooser.choose(reference)? {
                    PruneChoice::Remove => {
                        if manifest.remove(reference) {
                            report.removed.push(reference.clone());
                        }
                    }
                    PruneChoice::Skip => report.skipped.push(reference.clone()),
                }
            }
        }
    }

    if !report.removed.is_empty() {
        manifest
            .save(path)
            .with_context(|| format!("Failed to save manifest: {}", path.display()))?;
        report.saved = true;
        info!("Removed {} invalid reference(s) from {}", report.removed.len(), path.display());
    }

    Ok(report)
}
