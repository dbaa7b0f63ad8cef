//! Package CRUD on the store.
//!
//! Members are validated against the store only when a package is added;
//! later removals of member resources leave the package loadable, and
//! [`Repository::missing_package_members`] reports the gap.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use super::Repository;
use crate::constants::{PACKAGE_FILE_SUFFIX, PACKAGES_DIR};
use crate::core::AimgrError;
use crate::metadata::SourceInfo;
use crate::resource::{Package, validate_package_name};
use crate::utils::fs::ensure_dir;

impl Repository {
    /// Directory holding package documents.
    #[must_use]
    pub fn packages_dir(&self) -> PathBuf {
        self.root().join(PACKAGES_DIR)
    }

    /// Path of the document of package `name`.
    #[must_use]
    pub fn package_path(&self, name: &str) -> PathBuf {
        self.packages_dir().join(format!("{name}{PACKAGE_FILE_SUFFIX}"))
    }

    /// Whether package `name` exists.
    #[must_use]
    pub fn package_exists(&self, name: &str) -> bool {
        validate_package_name(name).is_ok() && self.package_path(name).is_file()
    }

    /// Store a package after checking that every member exists.
    ///
    /// Overwrites an existing package only with `force`.
    pub fn add_package(&self, package: &Package, source: &SourceInfo, force: bool) -> Result<()> {
        package.validate()?;

        if self.package_exists(&package.name) && !force {
            return Err(AimgrError::AlreadyExists {
                id: format!("package/{}", package.name),
            }
            .into());
        }

        for (raw, parsed) in package.members() {
            let id = parsed.with_context(|| format!("Invalid member in package '{}'", package.name))?;
            if !self.exists(id.kind, &id.name) {
                return Err(anyhow::anyhow!(
                    "Package '{}' references '{raw}' which does not exist in the repository",
                    package.name
                ));
            }
        }

        ensure_dir(&self.packages_dir())?;
        package.save(&self.package_path(&package.name))?;
        self.metadata().record_package(&package.name, source, package.resources.len(), None)?;

        info!("Added package/{} ({} resources)", package.name, package.resources.len());
        Ok(())
    }

    /// Load package `name`.
    pub fn get_package(&self, name: &str) -> Result<Package> {
        validate_package_name(name)?;
        let path = self.package_path(name);
        if !path.is_file() {
            return Err(AimgrError::PackageNotFound {
                name: name.to_string(),
            }
            .into());
        }
        Package::load(&path)
    }

    /// All loadable packages, sorted by name. Invalid documents are skipped with a warning.
    pub fn list_packages(&self) -> Result<Vec<Package>> {
        let dir = self.packages_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut packages = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("Failed to read {}", dir.display()))? {
            let path = entry?.path();
            let is_package = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(PACKAGE_FILE_SUFFIX));
            if !is_package {
                continue;
            }
            match Package::load(&path) {
                Ok(package) => packages.push(package),
                Err(e) => warn!("Skipping invalid package {}: {e:#}", path.display()),
            }
        }

        packages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(packages)
    }

    /// Remove package `name` and its metadata. Member resources are kept.
    pub fn remove_package(&self, name: &str) -> Result<()> {
        validate_package_name(name)?;
        let path = self.package_path(name);
        if !path.is_file() {
            return Err(AimgrError::PackageNotFound {
                name: name.to_string(),
            }
            .into());
        }

        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
        if let Err(e) = self.metadata().delete_package(name) {
            warn!("Removed package/{name} but failed to delete its metadata: {e:#}");
        }

        info!("Removed package/{name}");
        Ok(())
    }

    /// Member references that are malformed or absent from the store.
    #[must_use]
    pub fn missing_package_members(&self, package: &Package) -> Vec<String> {
        package
            .members()
            .into_iter()
            .filter(|(_, parsed)| match parsed {
                Ok(id) => !self.exists(id.kind, &id.name),
                Err(_) => true,
            })
            .map(|(raw, _)| raw)
            .collect()
    }
}
