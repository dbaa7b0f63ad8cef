//! Installing every member of a package.
//!
//! Members are processed independently; a failing member is recorded and the
//! rest continue.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use super::{Installer, LinkAction, UnlinkAction};
use crate::core::AimgrError;
use crate::repository::Repository;

/// Outcome of [`Installer::install_package`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageInstallReport {
    pub installed: Vec<String>,
    /// Members already installed
    pub skipped: Vec<String>,
    /// `(reference, reason)`
    pub failed: Vec<(String, String)>,
}

/// Outcome of [`Installer::uninstall_package`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageUninstallReport {
    pub removed: Vec<String>,
    /// Members that were not installed
    pub skipped: Vec<String>,
    /// `(reference, reason)`
    pub failed: Vec<(String, String)>,
}

impl Installer {
    /// Install every member of package `name`.
    ///
    /// Fails only when the package itself cannot be loaded.
    pub fn install_package(&self, repo: &Repository, name: &str) -> Result<PackageInstallReport> {
        let package = repo.get_package(name)?;
        let mut report = PackageInstallReport::default();

        for (reference, parsed) in package.members() {
            let id = match parsed {
                Ok(id) => id,
                Err(e) => {
                    report.failed.push((reference, e.to_string()));
                    continue;
                }
            };

            if self.is_installed(&id) {
                debug!("{id} already installed");
                report.skipped.push(reference);
                continue;
            }

            match self.install(repo, &id) {
                Ok(outcomes) if outcomes.is_empty() => {
                    report
                        .failed
                        .push((reference, format!("no target tool supports {}s", id.kind)));
                }
                Ok(outcomes) if outcomes.iter().all(|o| o.action == LinkAction::Occupied) => {
                    report
                        .failed
                        .push((reference, "target path is occupied by a file or directory".to_string()));
                }
                Ok(_) => report.installed.push(reference),
                Err(e) => {
                    warn!("Failed to install {reference} from package/{name}: {e:#}");
                    report.failed.push((reference, format!("{e:#}")));
                }
            }
        }

        Ok(report)
    }

    /// Uninstall every member of package `name`.
    pub fn uninstall_package(&self, repo: &Repository, name: &str) -> Result<PackageUninstallReport> {
        let package = repo.get_package(name)?;
        let mut report = PackageUninstallReport::default();

        for (reference, parsed) in package.members() {
            let id = match parsed {
                Ok(id) => id,
                Err(e) => {
                    report.failed.push((reference, e.to_string()));
                    continue;
                }
            };

            match self.uninstall(repo, &id) {
                Ok(outcomes) if outcomes.iter().any(|o| o.action == UnlinkAction::Removed) => {
                    report.removed.push(reference);
                }
                Ok(_) => report.skipped.push(reference),
                Err(e) if matches!(e.downcast_ref::<AimgrError>(), Some(AimgrError::NotInstalled { .. })) => {
                    report.skipped.push(reference);
                }
                Err(e) => report.failed.push((reference, format!("{e:#}"))),
            }
        }

        Ok(report)
    }
}
