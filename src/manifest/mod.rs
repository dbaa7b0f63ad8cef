//! Project manifest (`ai.package.yaml`).
//!
//! The manifest declares which resources and packages a project wants and,
//! optionally, which tools to install them into:
//!
//! ```yaml
//! resources:
//!   - skill/pdf-processing
//!   - command/api/deploy
//!   - package/web-tools
//! install:
//!   targets: [claude, opencode]
//! ```
//!
//! `resources` is an ordered set of `type/name` references. Older manifests
//! carried a top-level `targets:` list; it is moved into `install.targets` on
//! load and never written back.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::constants::MANIFEST_FILE_NAME;
use crate::core::AimgrError;
use crate::resource::Reference;
use crate::tools::Tool;
use crate::utils::fs::write_yaml_file;

/// Installation settings of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Tool names to install into
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
}

impl InstallConfig {
    fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Parsed `ai.package.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// `type/name` references, in declaration order
    #[serde(default)]
    pub resources: Vec<String>,

    #[serde(default, skip_serializing_if = "InstallConfig::is_empty")]
    pub install: InstallConfig,

    /// Legacy location of `install.targets`
    #[serde(default, skip_serializing)]
    targets: Vec<String>,
}

impl Manifest {
    /// Empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the manifest inside `project`.
    #[must_use]
    pub fn path_in(project: &Path) -> std::path::PathBuf {
        project.join(MANIFEST_FILE_NAME)
    }

    /// Whether a manifest file exists at `path`.
    #[must_use]
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    /// Load and validate a manifest.
    ///
    /// A missing file is [`AimgrError::ManifestNotFound`]; malformed YAML is
    /// [`AimgrError::ManifestParseError`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AimgrError::ManifestNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read manifest: {}", path.display()));
            }
        };

        let mut manifest: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| AimgrError::ManifestParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?
        };

        manifest.migrate_legacy_targets();
        manifest.validate()?;

        debug!("Loaded manifest {} ({} references)", path.display(), manifest.resources.len());
        Ok(manifest)
    }

    /// Load the manifest at `path`, or an empty one when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Validate and atomically write the manifest, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;

        write_yaml_file(path, self).with_context(|| format!("Failed to write manifest: {}", path.display()))?;

        debug!("Saved manifest {}", path.display());
        Ok(())
    }

    /// Check every reference and install target.
    pub fn validate(&self) -> Result<(), AimgrError> {
        for reference in &self.resources {
            Reference::parse(reference).map_err(|e| AimgrError::ManifestValidationError {
                reason: format!("invalid resource '{reference}': {e}"),
            })?;
        }

        for target in self.install.targets.iter().chain(&self.targets) {
            target.parse::<Tool>().map_err(|_| AimgrError::ManifestValidationError {
                reason: format!(
                    "invalid install.targets '{target}': must be 'claude', 'opencode', or 'copilot'"
                ),
            })?;
        }

        Ok(())
    }

    /// Append `reference` unless already declared.
    pub fn add(&mut self, reference: &str) -> Result<(), AimgrError> {
        Reference::parse(reference)?;
        if !self.contains(reference) {
            self.resources.push(reference.to_string());
        }
        Ok(())
    }

    /// Drop `reference`; returns whether it was declared.
    pub fn remove(&mut self, reference: &str) -> bool {
        let before = self.resources.len();
        self.resources.retain(|r| r != reference);
        self.resources.len() != before
    }

    #[must_use]
    pub fn contains(&self, reference: &str) -> bool {
        self.resources.iter().any(|r| r == reference)
    }

    /// Every declared reference with its parse result.
    #[must_use]
    pub fn references(&self) -> Vec<(String, Result<Reference, AimgrError>)> {
        self.resources.iter().map(|r| (r.clone(), Reference::parse(r))).collect()
    }

    /// Install targets as tools. Unknown names are rejected.
    pub fn target_tools(&self) -> Result<Vec<Tool>, AimgrError> {
        crate::tools::parse_tools(&self.install.targets)
    }

    fn migrate_legacy_targets(&mut self) {
        if !self.targets.is_empty() && self.install.targets.is_empty() {
            debug!("Migrating legacy 'targets' into 'install.targets'");
            self.install.targets = std::mem::take(&mut self.targets);
        } else {
            self.targets.clear();
        }
    }
}
