//! Batch import into the store.
//!
//! [`Repository::add_bulk`] classifies every candidate path as added,
//! updated, skipped or failed and keeps going; only a failure to initialise
//! the store aborts the batch. Packages are imported after resources so a
//! package can reference members from the same batch.

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{AddOptions, ImportMode, Repository};
use crate::constants::{PACKAGE_FILE_SUFFIX, PACKAGES_DIR, SKILL_ENTRY_FILE};
use crate::core::ResourceKind;
use crate::metadata::SourceInfo;
use crate::resource::{self, Package};
use crate::utils::fs::entry_exists;

/// Options for [`Repository::add_bulk`].
#[derive(Debug, Clone, Default)]
pub struct BulkImportOptions {
    /// Overwrite existing resources (reported as updated).
    pub force: bool,
    /// Skip existing resources instead of failing them.
    pub skip_existing: bool,
    /// Classify only; the store is not touched.
    pub dry_run: bool,
    /// Copy or link payloads.
    pub import_mode: ImportMode,
    /// Source URL recorded in metadata; both url and type are needed to override `file://`.
    pub source_url: Option<String>,
    pub source_type: Option<String>,
    pub source_ref: Option<String>,
    pub source_name: Option<String>,
}

impl BulkImportOptions {
    fn source_for(&self, path: &Path) -> SourceInfo {
        match (&self.source_url, &self.source_type) {
            (Some(url), Some(source_type)) if !url.is_empty() && !source_type.is_empty() => SourceInfo {
                source_type: source_type.clone(),
                source_url: url.clone(),
                source_name: self.source_name.clone(),
                source_ref: self.source_ref.clone(),
            },
            _ => {
                let abs = crate::utils::absolutize(path.to_path_buf()).unwrap_or_else(|_| path.to_path_buf());
                SourceInfo {
                    source_name: self.source_name.clone(),
                    ..SourceInfo::from_path(&abs)
                }
            }
        }
    }
}

/// One failed candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkImportResult {
    /// `kind/name` of newly added items
    pub added: Vec<String>,
    /// `kind/name` of items replaced under `force`
    pub updated: Vec<String>,
    /// `kind/name` of existing items left alone under `skip_existing`
    pub skipped: Vec<String>,
    pub failed: Vec<ImportFailure>,
    pub command_count: usize,
    pub skill_count: usize,
    pub agent_count: usize,
    pub package_count: usize,
}

impl BulkImportResult {
    /// Number of items added or updated.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.added.len() + self.updated.len()
    }

    fn count(&mut self, kind: Option<ResourceKind>) {
        match kind {
            Some(ResourceKind::Command) => self.command_count += 1,
            Some(ResourceKind::Skill) => self.skill_count += 1,
            Some(ResourceKind::Agent) => self.agent_count += 1,
            None => self.package_count += 1,
        }
    }

    fn succeed(&mut self, kind: Option<ResourceKind>, id: String, existing: &Existing) {
        self.count(kind);
        match existing {
            Existing::Replace => self.updated.push(id),
            Existing::Fresh | Existing::Skip => self.added.push(id),
        }
    }

    fn fail(&mut self, path: &Path, message: impl Into<String>) {
        let message = message.into();
        warn!("Import of {} failed: {message}", path.display());
        self.failed.push(ImportFailure {
            path: path.to_path_buf(),
            message,
        });
    }
}

enum Existing {
    Fresh,
    Replace,
    Skip,
}

impl Repository {
    /// Import every path in `paths`.
    ///
    /// Items ending in `.package.json` are packages; anything else goes through
    /// kind detection. A command below a `commands/` directory keeps its
    /// namespace (`commands/api/deploy.md` imports as `api/deploy`).
    pub fn add_bulk(&self, paths: &[PathBuf], options: &BulkImportOptions) -> Result<BulkImportResult> {
        if !options.dry_run {
            self.init()?;
        }

        let mut result = BulkImportResult::default();
        let (packages, resources): (Vec<&PathBuf>, Vec<&PathBuf>) = paths.iter().partition(|p| is_package_file(p));

        for path in resources {
            self.import_resource(path, options, &mut result);
        }
        for path in packages {
            self.import_package(path, options, &mut result);
        }

        debug!(
            "Bulk import: {} added, {} updated, {} skipped, {} failed",
            result.added.len(),
            result.updated.len(),
            result.skipped.len(),
            result.failed.len()
        );
        Ok(result)
    }

    fn import_resource(&self, path: &Path, options: &BulkImportOptions, result: &mut BulkImportResult) {
        let kind = match resource::detect_kind(path) {
            Ok(kind) => kind,
            Err(e) => return result.fail(path, e.to_string()),
        };

        let command_base = (kind == ResourceKind::Command).then(|| command_base_for(path)).flatten();
        let loaded = match &command_base {
            Some(base) => resource::load_command_nested(path, base),
            None => resource::load_as(kind, path),
        };
        let loaded = match loaded {
            Ok(loaded) => loaded,
            Err(e) => return result.fail(path, e.to_string()),
        };
        let id = loaded.id();

        let existing = match self.classify_existing(self.exists(kind, &id.name), &id.to_string(), options) {
            Ok(existing) => existing,
            Err(message) => return result.fail(path, message),
        };
        if matches!(existing, Existing::Skip) {
            result.skipped.push(id.to_string());
            return;
        }

        if !options.dry_run {
            let add_options = AddOptions {
                force: options.force,
                import_mode: options.import_mode,
                source: Some(options.source_for(path)),
                command_base,
            };
            if let Err(e) = self.add(path, kind, &add_options) {
                return result.fail(path, format!("{e:#}"));
            }
        }

        result.succeed(Some(kind), id.to_string(), &existing);
    }

    fn import_package(&self, path: &Path, options: &BulkImportOptions, result: &mut BulkImportResult) {
        let package = match Package::load(path) {
            Ok(package) => package,
            Err(e) => return result.fail(path, format!("{e:#}")),
        };
        let id = format!("package/{}", package.name);

        let existing = match self.classify_existing(self.package_exists(&package.name), &id, options) {
            Ok(existing) => existing,
            Err(message) => return result.fail(path, message),
        };
        if matches!(existing, Existing::Skip) {
            result.skipped.push(id);
            return;
        }

        if !options.dry_run
            && let Err(e) = self.add_package(&package, &options.source_for(path), options.force)
        {
            return result.fail(path, format!("{e:#}"));
        }

        result.succeed(None, id, &existing);
    }

    fn classify_existing(&self, exists: bool, id: &str, options: &BulkImportOptions) -> Result<Existing, String> {
        if !exists {
            Ok(Existing::Fresh)
        } else if options.force {
            Ok(Existing::Replace)
        } else if options.skip_existing {
            Ok(Existing::Skip)
        } else {
            Err(format!("'{id}' already exists in repository ({})", self.root().display()))
        }
    }
}

fn is_package_file(path: &Path) -> bool {
    path.to_string_lossy().ends_with(PACKAGE_FILE_SUFFIX)
}

/// Nearest ancestor directory named `commands`, if any.
fn command_base_for(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .skip(1)
        .find(|dir| dir.file_name().is_some_and(|n| n == ResourceKind::Command.plural()))
        .map(Path::to_path_buf)
}

/// Find importable items below `dir`.
///
/// Looks for `commands/**/*.md`, `skills/<name>/SKILL.md`, `agents/*.md` and
/// `packages/*.package.json`. A directory that is itself a skill, or a single
/// file, is returned as is.
pub fn discover(dir: &Path) -> Vec<PathBuf> {
    if dir.is_file() || dir.join(SKILL_ENTRY_FILE).is_file() {
        return vec![dir.to_path_buf()];
    }

    let mut found = Vec::new();

    let commands = dir.join(ResourceKind::Command.plural());
    if commands.is_dir() {
        for entry in WalkDir::new(&commands)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden_name(e.file_name()))
            .filter_map(Result::ok)
        {
            if entry.file_type().is_file() && has_extension(entry.path(), "md") {
                found.push(entry.into_path());
            }
        }
    }

    let skills = dir.join(ResourceKind::Skill.plural());
    for path in child_entries(&skills) {
        if path.join(SKILL_ENTRY_FILE).is_file() {
            found.push(path);
        }
    }

    let agents = dir.join(ResourceKind::Agent.plural());
    for path in child_entries(&agents) {
        if path.is_file() && has_extension(&path, "md") {
            found.push(path);
        }
    }

    for path in child_entries(&dir.join(PACKAGES_DIR)) {
        if path.is_file() && is_package_file(&path) {
            found.push(path);
        }
    }

    debug!("Discovered {} importable item(s) in {}", found.len(), dir.display());
    found
}

fn child_entries(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| entry_exists(p) && !p.file_name().is_some_and(is_hidden_name))
        .collect();
    paths.sort();
    paths
}

fn is_hidden_name(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}
