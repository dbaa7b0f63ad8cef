//! Provenance records for stored resources and packages.
//!
//! Metadata lives under `<repo>/.metadata/`, separate from the payload tree:
//!
//! ```text
//! .metadata/
//! ├── commands/deploy-metadata.json
//! ├── commands/api-deploy-metadata.json   # nested name "api/deploy"
//! ├── skills/pdf-processing-metadata.json
//! ├── agents/reviewer-metadata.json
//! └── packages/web-tools-metadata.json
//! ```
//!
//! A resource may exist without metadata (it was placed by hand). Metadata
//! without a backing resource is orphaned and reported by repository verify.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{METADATA_DIR, METADATA_FILE_SUFFIX, PACKAGES_DIR};
use crate::core::ResourceKind;
use crate::utils::fs::{ensure_dir, read_json_file, write_json_file};

/// Source type recorded for items imported from a local path.
pub const SOURCE_TYPE_FILE: &str = "file";

/// Source type recorded when metadata is created for hand-placed resources.
pub const SOURCE_TYPE_LOCAL: &str = "local";

/// Source type recorded for packages created on the command line.
pub const SOURCE_TYPE_MANUAL: &str = "manual";

/// Where an item came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInfo {
    /// `file`, `local`, `github`, ...
    pub source_type: String,
    /// URL or `file://` path
    pub source_url: String,
    /// Human readable source name; derived from the URL when absent
    pub source_name: Option<String>,
    /// Git ref, when the source is a repository
    pub source_ref: Option<String>,
}

impl SourceInfo {
    /// Source info for a local path: `file://<abs path>` with type `file`.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        Self {
            source_type: SOURCE_TYPE_FILE.to_string(),
            source_url: format!("file://{}", path.display()),
            source_name: None,
            source_ref: None,
        }
    }

    fn resolved_name(&self) -> String {
        self.source_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| derive_source_name(&self.source_url))
    }
}

/// Provenance record of a stored resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub source_type: String,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    pub first_installed: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Provenance record of a stored package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    pub source_type: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    pub first_added: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub resource_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_format: Option<String>,
}

/// Reader/writer for the `.metadata` tree of one repository.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    dir: PathBuf,
}

impl MetadataStore {
    /// Metadata store of the repository rooted at `repo_root`.
    #[must_use]
    pub fn new(repo_root: &Path) -> Self {
        Self {
            dir: repo_root.join(METADATA_DIR),
        }
    }

    /// The `.metadata` directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory holding records of one kind.
    #[must_use]
    pub fn kind_dir(&self, kind: ResourceKind) -> PathBuf {
        self.dir.join(kind.plural())
    }

    /// Directory holding package records.
    #[must_use]
    pub fn packages_dir(&self) -> PathBuf {
        self.dir.join(PACKAGES_DIR)
    }

    /// Record path for a resource; `/` in nested names becomes `-`.
    #[must_use]
    pub fn path_for(&self, kind: ResourceKind, name: &str) -> PathBuf {
        self.kind_dir(kind).join(record_file_name(name))
    }

    /// Record path for a package.
    #[must_use]
    pub fn package_path(&self, name: &str) -> PathBuf {
        self.packages_dir().join(record_file_name(name))
    }

    /// Load a resource record; `Ok(None)` when none exists.
    pub fn load(&self, kind: ResourceKind, name: &str) -> Result<Option<ResourceMetadata>> {
        load_optional(&self.path_for(kind, name))
    }

    /// Write (or refresh) the record of a resource.
    ///
    /// An existing record keeps its `first_installed` timestamp.
    pub fn record(&self, kind: ResourceKind, name: &str, source: &SourceInfo) -> Result<ResourceMetadata> {
        let now = Utc::now();
        let first_installed = match self.load(kind, name) {
            Ok(Some(existing)) => existing.first_installed,
            _ => now,
        };

        let metadata = ResourceMetadata {
            name: name.to_string(),
            kind,
            source_type: source.source_type.clone(),
            source_url: source.source_url.clone(),
            source_name: Some(source.resolved_name()),
            git_ref: source.source_ref.clone(),
            first_installed,
            last_updated: now,
        };
        self.save(&metadata)?;
        Ok(metadata)
    }

    /// Write a resource record as given.
    pub fn save(&self, metadata: &ResourceMetadata) -> Result<()> {
        let path = self.path_for(metadata.kind, &metadata.name);
        ensure_dir(&self.kind_dir(metadata.kind))?;
        write_json_file(&path, metadata)
            .with_context(|| format!("Failed to write metadata for {}/{}", metadata.kind, metadata.name))?;
        debug!("Wrote metadata {}", path.display());
        Ok(())
    }

    /// Delete a resource record; returns whether one existed.
    pub fn delete(&self, kind: ResourceKind, name: &str) -> Result<bool> {
        delete_if_present(&self.path_for(kind, name))
    }

    /// Load a package record; `Ok(None)` when none exists.
    pub fn load_package(&self, name: &str) -> Result<Option<PackageMetadata>> {
        load_optional(&self.package_path(name))
    }

    /// Write (or refresh) the record of a package, keeping `first_added`.
    pub fn record_package(
        &self,
        name: &str,
        source: &SourceInfo,
        resource_count: usize,
        original_format: Option<String>,
    ) -> Result<PackageMetadata> {
        let now = Utc::now();
        let first_added = match self.load_package(name) {
            Ok(Some(existing)) => existing.first_added,
            _ => now,
        };

        let metadata = PackageMetadata {
            name: name.to_string(),
            source_type: source.source_type.clone(),
            source_url: source.source_url.clone(),
            source_ref: source.source_ref.clone(),
            first_added,
            last_updated: now,
            resource_count,
            original_format,
        };

        ensure_dir(&self.packages_dir())?;
        write_json_file(&self.package_path(name), &metadata)
            .with_context(|| format!("Failed to write metadata for package/{name}"))?;
        Ok(metadata)
    }

    /// Delete a package record; returns whether one existed.
    pub fn delete_package(&self, name: &str) -> Result<bool> {
        delete_if_present(&self.package_path(name))
    }

    /// Record files present in a metadata directory, as `(escaped name, path)`.
    ///
    /// The escaped name is the file name without the `-metadata.json` suffix;
    /// for nested commands it cannot be mapped back to the original name.
    pub fn record_files(&self, dir: &Path) -> Result<Vec<(String, PathBuf)>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(stem) = file_name.strip_suffix(METADATA_FILE_SUFFIX)
                && path.is_file()
            {
                records.push((stem.to_string(), path.clone()));
            }
        }
        records.sort();
        Ok(records)
    }
}

/// Escaped record file name for `name`.
#[must_use]
pub fn record_file_name(name: &str) -> String {
    format!("{}{METADATA_FILE_SUFFIX}", escape_name(name))
}

/// Flatten a nested name for use as a file name (`api/deploy` -> `api-deploy`).
#[must_use]
pub fn escape_name(name: &str) -> String {
    name.replace('/', "-")
}

fn load_optional<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    read_json_file(path).map(Some)
}

fn delete_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Deleted metadata {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to delete metadata: {}", path.display())),
    }
}

/// Derive a short source name from a source URL or path.
///
/// - `gh:owner/repo` and `https://github.com/owner/repo` -> `owner-repo`
/// - `file:///home/user/resources` and `/home/user/resources` -> `resources`
/// - other http(s) URLs -> last path segment
/// - anything else -> `/` replaced by `-`
#[must_use]
pub fn derive_source_name(source_url: &str) -> String {
    if source_url.is_empty() {
        return "unknown".to_string();
    }

    if let Some(rest) = source_url.strip_prefix("gh:") {
        return owner_repo(rest).unwrap_or_else(|| rest.replace('/', "-"));
    }

    if let Some(path) = source_url.strip_prefix("file://") {
        return base_name(path);
    }

    if let Some(rest) = source_url.strip_prefix("https://github.com/")
        && let Some(name) = owner_repo(rest)
    {
        return name;
    }

    if source_url.starts_with("http://") || source_url.starts_with("https://") {
        return source_url.rsplit('/').next().unwrap_or_default().to_string();
    }

    if source_url.starts_with('/') || source_url.starts_with("./") || source_url.starts_with("../") {
        return base_name(source_url);
    }

    source_url.replace('/', "-")
}

fn owner_repo(rest: &str) -> Option<String> {
    let mut parts = rest.split('/');
    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) => Some(format!("{owner}-{repo}")),
        _ => None,
    }
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map_or_else(|| path.to_string(), |name| name.to_string_lossy().into_owned())
}
