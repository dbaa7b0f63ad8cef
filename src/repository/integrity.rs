//! Consistency checks between stored payloads and their metadata records.
//!
//! | check                          | severity |
//! |--------------------------------|----------|
//! | resource without metadata      | warning  |
//! | metadata without resource      | error    |
//! | metadata records another kind  | error    |
//! | `file://` source path is gone  | warning  |
//! | package references a gap       | error    |
//!
//! With `fix`, missing metadata is created (source type `local`) and orphaned
//! records are deleted. Other findings are reported only.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::Repository;
use crate::core::ResourceKind;
use crate::metadata::{PackageMetadata, ResourceMetadata, SOURCE_TYPE_LOCAL, SourceInfo};
use crate::pattern::{Selector, SelectorKind};
use crate::resource::PACKAGE_KIND;

/// One finding of [`Repository::check_integrity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "kebab-case")]
pub enum IntegrityIssue {
    /// A stored resource has no metadata record.
    MissingMetadata {
        kind: ResourceKind,
        name: String,
        path: PathBuf,
    },
    /// A metadata record whose resource or package is gone.
    OrphanedMetadata {
        /// `command`, `skill`, `agent` or `package`
        kind: String,
        name: String,
        path: PathBuf,
    },
    /// The record found for a resource names a different kind.
    TypeMismatch {
        name: String,
        resource_kind: ResourceKind,
        metadata_kind: ResourceKind,
        resource_path: PathBuf,
        metadata_path: PathBuf,
    },
    /// The local source a resource was imported from no longer exists.
    MissingSource {
        kind: ResourceKind,
        name: String,
        metadata_path: PathBuf,
        source_path: PathBuf,
    },
    /// A package lists members that are malformed or absent.
    PackageMissingRefs {
        name: String,
        path: PathBuf,
        missing: Vec<String>,
    },
}

impl IntegrityIssue {
    /// Whether this finding is an error rather than a warning.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(
            self,
            Self::OrphanedMetadata { .. } | Self::TypeMismatch { .. } | Self::PackageMissingRefs { .. }
        )
    }

    /// One line human description.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::MissingMetadata { kind, name, .. } => format!("{kind}/{name} has no metadata"),
            Self::OrphanedMetadata { kind, name, path } => {
                format!("orphaned metadata for {kind}/{name} ({})", path.display())
            }
            Self::TypeMismatch {
                name,
                resource_kind,
                metadata_kind,
                ..
            } => format!("{resource_kind}/{name} has metadata of type '{metadata_kind}'"),
            Self::MissingSource {
                kind,
                name,
                source_path,
                ..
            } => format!("{kind}/{name} source path no longer exists: {}", source_path.display()),
            Self::PackageMissingRefs { name, missing, .. } => {
                format!("package/{name} references missing resources: {}", missing.join(", "))
            }
        }
    }
}

/// Result of an integrity check.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrityReport {
    pub issues: Vec<IntegrityIssue>,
    /// Metadata records created or deleted by `fix`.
    pub fixed: usize,
}

impl IntegrityReport {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(IntegrityIssue::is_error)
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| !i.is_error())
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl Repository {
    /// Check payloads against metadata, optionally restricted to `selector`.
    ///
    /// A store that does not exist is clean.
    pub fn check_integrity(&self, selector: Option<&Selector>, fix: bool) -> Result<IntegrityReport> {
        let mut report = IntegrityReport::default();
        if !self.root().is_dir() {
            return Ok(report);
        }

        let selected = |kind: SelectorKind, name: &str| selector.is_none_or(|s| s.matches(kind, name));

        let resources: Vec<_> = self
            .list(None)?
            .into_iter()
            .filter(|r| selected(SelectorKind::Resource(r.kind), &r.name))
            .collect();
        let packages: Vec<_> = self
            .list_packages()?
            .into_iter()
            .filter(|p| selected(SelectorKind::Package, &p.name))
            .collect();

        for resource in &resources {
            let (kind, name) = (resource.kind, resource.name.as_str());
            let metadata_path = self.metadata().path_for(kind, name);

            let record = match self.metadata().load(kind, name) {
                Ok(Some(record)) => record,
                Ok(None) => {
                    report.issues.push(IntegrityIssue::MissingMetadata {
                        kind,
                        name: name.to_string(),
                        path: self.path_for(kind, name),
                    });
                    if fix {
                        self.create_local_metadata(kind, name)?;
                        report.fixed += 1;
                    }
                    continue;
                }
                Err(e) => {
                    warn!("Unreadable metadata for {kind}/{name}: {e:#}");
                    continue;
                }
            };

            if record.kind != kind {
                report.issues.push(IntegrityIssue::TypeMismatch {
                    name: name.to_string(),
                    resource_kind: kind,
                    metadata_kind: record.kind,
                    resource_path: self.path_for(kind, name),
                    metadata_path: metadata_path.clone(),
                });
            }

            if let Some(source_path) = record.source_url.strip_prefix("file://")
                && !Path::new(source_path).exists()
            {
                report.issues.push(IntegrityIssue::MissingSource {
                    kind,
                    name: name.to_string(),
                    metadata_path,
                    source_path: PathBuf::from(source_path),
                });
            }
        }

        let present: BTreeSet<(SelectorKind, String)> = resources
            .iter()
            .map(|r| (SelectorKind::Resource(r.kind), r.name.clone()))
            .chain(packages.iter().map(|p| (SelectorKind::Package, p.name.clone())))
            .collect();

        for (kind, name, path) in self.metadata_records(selector.and_then(Selector::kind_filter))? {
            if !selected(kind, &name) || present.contains(&(kind, name.clone())) {
                continue;
            }
            if fix {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove orphaned metadata: {}", path.display()))?;
                report.fixed += 1;
                info!("Removed orphaned metadata {}", path.display());
            }
            report.issues.push(IntegrityIssue::OrphanedMetadata {
                kind: kind.to_string(),
                name,
                path,
            });
        }

        for package in &packages {
            let missing = self.missing_package_members(package);
            if !missing.is_empty() {
                report.issues.push(IntegrityIssue::PackageMissingRefs {
                    name: package.name.clone(),
                    path: self.package_path(&package.name),
                    missing,
                });
            }
        }

        Ok(report)
    }

    fn create_local_metadata(&self, kind: ResourceKind, name: &str) -> Result<()> {
        let path = self.path_for(kind, name);
        let abs = fs::canonicalize(&path).unwrap_or(path);
        let source = SourceInfo {
            source_type: SOURCE_TYPE_LOCAL.to_string(),
            ..SourceInfo::from_path(&abs)
        };
        self.metadata()
            .record(kind, name, &source)
            .with_context(|| format!("Failed to create metadata for {kind}/{name}"))?;
        info!("Created metadata for {kind}/{name}");
        Ok(())
    }

    /// Every metadata record as `(kind, recorded name, path)`.
    ///
    /// The name comes from the record content since file names flatten nested
    /// command names. Unparsable records are skipped with a warning.
    fn metadata_records(&self, only: Option<SelectorKind>) -> Result<Vec<(SelectorKind, String, PathBuf)>> {
        let mut records = Vec::new();

        let kinds = ResourceKind::ALL
            .into_iter()
            .map(SelectorKind::Resource)
            .chain([SelectorKind::Package])
            .filter(|k| only.is_none_or(|o| o == *k));

        for kind in kinds {
            let dir = match kind {
                SelectorKind::Resource(k) => self.metadata().kind_dir(k),
                SelectorKind::Package => self.metadata().packages_dir(),
            };
            for (_, path) in self.metadata().record_files(&dir)? {
                let name = match kind {
                    SelectorKind::Resource(_) => {
                        crate::utils::fs::read_json_file::<ResourceMetadata>(&path).map(|m| m.name)
                    }
                    SelectorKind::Package => {
                        crate::utils::fs::read_json_file::<PackageMetadata>(&path).map(|m| m.name)
                    }
                };
                match name {
                    Ok(name) => records.push((kind, name, path)),
                    Err(e) => warn!("Skipping unreadable {} metadata {}: {e:#}", kind_label(kind), path.display()),
                }
            }
        }
        Ok(records)
    }
}

fn kind_label(kind: SelectorKind) -> &'static str {
    match kind {
        SelectorKind::Resource(k) => k.singular(),
        SelectorKind::Package => PACKAGE_KIND,
    }
}
