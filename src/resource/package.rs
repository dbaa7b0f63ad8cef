//! Package documents: named, flat lists of resource references.
//!
//! A package is stored as `<repo>/packages/<name>.package.json`. Member
//! references are kept as raw strings so a package stays loadable after one
//! of its members disappears from the store; existence is only checked when
//! the package is created.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{AimgrError, ResourceId};
use crate::resource::name::validate_package_name;
use crate::resource::reference::Reference;
use crate::utils::fs::{read_json_file, write_json_file};

/// A package document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Package name (matches the file name without `.package.json`)
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Member references in `type/name` form
    #[serde(default)]
    pub resources: Vec<String>,
}

impl Package {
    /// Create a package.
    pub fn new(name: impl Into<String>, description: impl Into<String>, resources: Vec<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            resources,
        }
    }

    /// Load and validate a package document.
    pub fn load(path: &Path) -> Result<Self> {
        let package: Self = read_json_file(path)?;
        package
            .validate()
            .with_context(|| format!("Invalid package file: {}", path.display()))?;
        Ok(package)
    }

    /// Validate and write the package as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        write_json_file(path, self)
    }

    /// Check required fields and the name. Member references are not checked.
    pub fn validate(&self) -> Result<(), AimgrError> {
        if self.name.is_empty() {
            return Err(AimgrError::Other {
                message: "package name is required".to_string(),
            });
        }
        if self.description.trim().is_empty() {
            return Err(AimgrError::Other {
                message: format!("package '{}' description is required", self.name),
            });
        }
        validate_package_name(&self.name)
    }

    /// Parse each member reference.
    ///
    /// Members must be resource references; packages do not nest.
    #[must_use]
    pub fn members(&self) -> Vec<(String, Result<ResourceId, AimgrError>)> {
        self.resources
            .iter()
            .map(|raw| {
                let parsed = Reference::parse(raw).and_then(|reference| match reference {
                    Reference::Resource(id) => Ok(id),
                    Reference::Package(_) => Err(AimgrError::InvalidReference {
                        reference: raw.clone(),
                        reason: "packages cannot contain other packages".to_string(),
                    }),
                });
                (raw.clone(), parsed)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResourceKind;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("web-tools.package.json");
        let package = Package::new(
            "web-tools",
            "Tools for web work",
            vec!["skill/html".to_string(), "command/build".to_string()],
        );

        package.save(&path).unwrap();
        assert_eq!(Package::load(&path).unwrap(), package);
    }

    #[test]
    fn test_load_requires_description() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bad.package.json");
        fs::write(&path, r#"{"name": "bad", "resources": []}"#).unwrap();

        let err = Package::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("description is required"));
    }

    #[test]
    fn test_load_rejects_invalid_name() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bad.package.json");
        fs::write(&path, r#"{"name": "Bad_Name", "description": "x", "resources": []}"#).unwrap();

        assert!(Package::load(&path).is_err());
    }

    #[test]
    fn test_members() {
        let package = Package::new(
            "mixed",
            "Mixed",
            vec![
                "skill/pdf".to_string(),
                "package/other".to_string(),
                "nonsense".to_string(),
            ],
        );

        let members = package.members();
        assert_eq!(members.len(), 3);
        assert_eq!(members[0].1.as_ref().unwrap(), &ResourceId::new(ResourceKind::Skill, "pdf"));
        assert!(members[1].1.is_err());
        assert!(members[2].1.is_err());
    }
}
