//! The resource store.
//!
//! A [`Repository`] owns the canonical on-disk layout:
//!
//! ```text
//! <repo>/
//! ├── commands/<name>.md          # nested names: commands/api/deploy.md
//! ├── skills/<name>/SKILL.md
//! ├── agents/<name>.md
//! ├── packages/<name>.package.json
//! ├── .metadata/                  # see crate::metadata
//! └── .locks/                     # see lock
//! ```
//!
//! The store never looks at project directories; links into it are the
//! installer's business.
//!
//! # Submodules
//!
//! - [`packages`]: package CRUD
//! - [`bulk`]: batch import with per-item classification, and discovery
//! - [`integrity`]: consistency checks between payloads and metadata
//! - [`lock`]: advisory lock for mutating commands

pub mod bulk;
pub mod integrity;
pub mod lock;
pub mod packages;

pub use bulk::{BulkImportOptions, BulkImportResult, ImportFailure, discover};
pub use integrity::{IntegrityIssue, IntegrityReport};
pub use lock::RepoLock;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use strsim::levenshtein;
use tracing::{debug, info, warn};

use crate::config::GlobalConfig;
use crate::constants::{METADATA_DIR, PACKAGES_DIR};
use crate::core::{AimgrError, ResourceId, ResourceKind};
use crate::metadata::{MetadataStore, SourceInfo};
use crate::pattern::Candidate;
use crate::resource::{self, Resource, validate_name_for};
use crate::utils::fs::{
    copy_dir, create_symlink, ensure_dir, ensure_parent_dir, entry_exists, is_symlink,
    prune_empty_dirs, remove_dir_all, remove_symlink,
};

/// Maximum Levenshtein distance, as a percentage of the name length, for "did you mean".
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// How a payload is placed into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Copy the file or directory tree.
    #[default]
    Copy,
    /// Link the store entry to the source path.
    Symlink,
}

/// Options for [`Repository::add`].
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Replace an existing resource of the same identity.
    pub force: bool,
    /// Copy or link the payload.
    pub import_mode: ImportMode,
    /// Provenance to record; defaults to `file://<abs source path>`.
    pub source: Option<SourceInfo>,
    /// For commands: directory the source is relative to, giving a nested name.
    pub command_base: Option<PathBuf>,
}

/// The canonical resource store.
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    metadata: MetadataStore,
}

impl Repository {
    /// Repository rooted at `root`. Nothing is created until [`Repository::init`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let metadata = MetadataStore::new(&root);
        Self {
            root,
            metadata,
        }
    }

    /// Repository at the location resolved from environment and config.
    pub fn open(config: &GlobalConfig) -> Result<Self> {
        Ok(Self::new(config.resolve_repo_path()?))
    }

    /// Store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Metadata records of this store.
    #[must_use]
    pub const fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Create the store layout if missing.
    pub fn init(&self) -> Result<()> {
        for kind in ResourceKind::ALL {
            ensure_dir(&self.kind_dir(kind))?;
        }
        ensure_dir(&self.root.join(PACKAGES_DIR))?;
        ensure_dir(&self.root.join(METADATA_DIR))?;
        debug!("Initialized repository at {}", self.root.display());
        Ok(())
    }

    /// Directory holding payloads of `kind`.
    #[must_use]
    pub fn kind_dir(&self, kind: ResourceKind) -> PathBuf {
        self.root.join(kind.plural())
    }

    /// Canonical payload path of `(kind, name)`.
    #[must_use]
    pub fn path_for(&self, kind: ResourceKind, name: &str) -> PathBuf {
        kind.entry_path(&self.kind_dir(kind), name)
    }

    /// Whether a payload exists for `(kind, name)` (links count, even dangling ones).
    ///
    /// Invalid names never exist.
    #[must_use]
    pub fn exists(&self, kind: ResourceKind, name: &str) -> bool {
        validate_name_for(kind, name).is_ok() && entry_exists(&self.path_for(kind, name))
    }

    /// Load a stored resource.
    pub fn get(&self, kind: ResourceKind, name: &str) -> Result<Resource> {
        validate_name_for(kind, name)?;
        let path = self.path_for(kind, name);
        if !entry_exists(&path) {
            return Err(self.not_found(&ResourceId::new(kind, name)).into());
        }

        let loaded = match kind {
            ResourceKind::Command => resource::load_command_nested(&path, &self.kind_dir(kind)),
            other => resource::load_as(other, &path),
        };
        loaded.with_context(|| format!("Failed to load {kind}/{name} from repository"))
    }

    /// Validate `source` as a `kind` resource and place it into the store.
    ///
    /// Refuses to overwrite an existing resource unless `force` is set. Metadata
    /// is written after the payload; an existing record keeps its
    /// `first_installed` timestamp.
    pub fn add(&self, source: &Path, kind: ResourceKind, options: &AddOptions) -> Result<Resource> {
        let loaded = match (kind, &options.command_base) {
            (ResourceKind::Command, Some(base)) => resource::load_command_nested(source, base),
            _ => resource::load_as(kind, source),
        }?;

        let name = loaded.name.clone();
        let dest = self.path_for(kind, &name);

        if entry_exists(&dest) {
            if !options.force {
                return Err(AimgrError::AlreadyExists {
                    id: loaded.id().to_string(),
                }
                .into());
            }
            debug!("Replacing existing {kind}/{name}");
            remove_payload(&dest)?;
        }

        ensure_parent_dir(&dest)?;
        let abs_source = fs::canonicalize(source)
            .with_context(|| format!("Failed to resolve source path: {}", source.display()))?;

        match options.import_mode {
            ImportMode::Symlink => create_symlink(&abs_source, &dest)?,
            ImportMode::Copy if kind.is_directory() => copy_dir(&abs_source, &dest)?,
            ImportMode::Copy => {
                fs::copy(&abs_source, &dest).with_context(|| {
                    format!("Failed to copy {} to {}", abs_source.display(), dest.display())
                })?;
            }
        }

        let source_info = options
            .source
            .clone()
            .unwrap_or_else(|| SourceInfo::from_path(&abs_source));
        self.metadata.record(kind, &name, &source_info)?;

        info!("Added {kind}/{name} to repository");
        Ok(Resource {
            path: dest,
            ..loaded
        })
    }

    /// Remove a resource and its metadata.
    ///
    /// Metadata removal is best effort once the payload is gone. Namespace
    /// directories left empty by a nested command are pruned.
    pub fn remove(&self, kind: ResourceKind, name: &str) -> Result<()> {
        validate_name_for(kind, name)?;
        let path = self.path_for(kind, name);
        if !entry_exists(&path) {
            return Err(self.not_found(&ResourceId::new(kind, name)).into());
        }

        remove_payload(&path)?;

        if let Err(e) = self.metadata.delete(kind, name) {
            warn!("Removed {kind}/{name} but failed to delete its metadata: {e:#}");
        }

        if let Some(parent) = path.parent() {
            prune_empty_dirs(parent, &self.kind_dir(kind));
        }

        info!("Removed {kind}/{name} from repository");
        Ok(())
    }

    /// List stored resources, optionally of one kind, sorted by `(kind, name)`.
    ///
    /// A missing store lists as empty. Entries that fail to load are skipped
    /// with a warning.
    pub fn list(&self, kind: Option<ResourceKind>) -> Result<Vec<Resource>> {
        let kinds: Vec<ResourceKind> = kind.map_or_else(|| ResourceKind::ALL.to_vec(), |k| vec![k]);
        let mut resources = Vec::new();

        for kind in kinds {
            let dir = self.kind_dir(kind);
            if !dir.is_dir() {
                continue;
            }
            match kind {
                ResourceKind::Command => list_commands(&dir, &dir, &mut resources)?,
                ResourceKind::Skill => list_skills(&dir, &mut resources)?,
                ResourceKind::Agent => list_agents(&dir, &mut resources)?,
            }
        }

        resources.sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));
        Ok(resources)
    }

    /// Every resource and package as selector candidates.
    pub fn candidates(&self) -> Result<Vec<Candidate>> {
        let mut candidates: Vec<Candidate> = self
            .list(None)?
            .into_iter()
            .map(|r| Candidate::resource(r.kind, r.name))
            .collect();
        candidates.extend(self.list_packages()?.into_iter().map(|p| Candidate::package(p.name)));
        Ok(candidates)
    }

    /// Not-found error with the closest name of the same kind as suggestion.
    pub(crate) fn not_found(&self, id: &ResourceId) -> AimgrError {
        let names: Vec<String> = self
            .list(Some(id.kind))
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.name)
            .collect();

        AimgrError::ResourceNotFound {
            id: id.to_string(),
            suggestion: closest_name(&id.name, &names).map(|name| format!("{}/{name}", id.kind)),
        }
    }
}

fn list_commands(dir: &Path, base: &Path, out: &mut Vec<Resource>) -> Result<()> {
    for path in sorted_entries(dir)? {
        if is_hidden(&path) {
            continue;
        }
        if path.is_dir() {
            list_commands(&path, base, out)?;
        } else if is_markdown(&path) {
            match resource::load_command_nested(&path, base) {
                Ok(resource) => out.push(resource),
                Err(e) => warn!("Skipping invalid command {}: {e}", path.display()),
            }
        }
    }
    Ok(())
}

fn list_skills(dir: &Path, out: &mut Vec<Resource>) -> Result<()> {
    for path in sorted_entries(dir)? {
        if is_hidden(&path) || !path.is_dir() {
            continue;
        }
        match resource::load_skill(&path) {
            Ok(resource) => out.push(resource),
            Err(e) => warn!("Skipping invalid skill {}: {e}", path.display()),
        }
    }
    Ok(())
}

fn list_agents(dir: &Path, out: &mut Vec<Resource>) -> Result<()> {
    for path in sorted_entries(dir)? {
        if is_hidden(&path) || !is_markdown(&path) {
            continue;
        }
        match resource::load_agent(&path) {
            Ok(resource) => out.push(resource),
            Err(e) => warn!("Skipping invalid agent {}: {e}", path.display()),
        }
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))? {
        entries.push(entry?.path());
    }
    entries.sort();
    Ok(entries)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with('.'))
}

fn is_markdown(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == crate::constants::MARKDOWN_EXTENSION)
}

/// Remove a payload: a link, a file or a directory tree.
fn remove_payload(path: &Path) -> Result<()> {
    if is_symlink(path) {
        remove_symlink(path)
    } else if path.is_dir() {
        remove_dir_all(path)
    } else {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))
    }
}

/// Closest candidate within the similarity threshold.
pub(crate) fn closest_name(target: &str, candidates: &[String]) -> Option<String> {
    let max_distance = (target.len() * SIMILARITY_THRESHOLD_PERCENT / 100).max(1);
    candidates
        .iter()
        .map(|candidate| (levenshtein(target, candidate), candidate))
        .filter(|(distance, _)| *distance <= max_distance)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.clone())
}
