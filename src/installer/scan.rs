//! Directory scanning shared by listing, cleaning, verification and reset.
//!
//! A tool kind directory is read one entry at a time without following links.
//! For commands, a real sub-directory is a namespace and its children are read
//! as well (one level), yielding names such as `api/deploy`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::ResourceKind;

/// What sits at a scanned path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryType {
    /// A symbolic link with its raw target text.
    Link(PathBuf),
    /// A symbolic link whose target could not be read.
    UnreadableLink(String),
    /// A regular file.
    File,
    /// A real directory (for commands: only below a namespace).
    Dir,
}

/// One entry of a tool kind directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedEntry {
    pub kind: ResourceKind,
    /// Resource name: `.md` stripped for file kinds, namespace kept
    pub name: String,
    pub path: PathBuf,
    pub entry: EntryType,
}

impl ScannedEntry {
    #[must_use]
    pub const fn is_link(&self) -> bool {
        matches!(self.entry, EntryType::Link(_) | EntryType::UnreadableLink(_))
    }

    /// Raw link target, when this is a readable link.
    #[must_use]
    pub fn link_target(&self) -> Option<&Path> {
        match &self.entry {
            EntryType::Link(target) => Some(target),
            _ => None,
        }
    }

    /// Whether a link's target exists.
    #[must_use]
    pub fn resolves(&self) -> bool {
        self.is_link() && fs::metadata(&self.path).is_ok()
    }
}

/// Scan `dir` holding entries of `kind`. A missing directory yields nothing.
///
/// Hidden entries are skipped. Results are sorted by path.
pub fn scan_kind_dir(dir: &Path, kind: ResourceKind) -> Result<Vec<ScannedEntry>> {
    let mut entries = Vec::new();
    if !dir.is_dir() {
        return Ok(entries);
    }

    for path in read_sorted(dir)? {
        let entry = classify(&path)?;
        let entry_name = file_name(&path);

        if kind.allows_nested_names() && entry == EntryType::Dir {
            for child in read_sorted(&path)? {
                let child_entry = classify(&child)?;
                let child_name = file_name(&child);
                entries.push(ScannedEntry {
                    kind,
                    name: format!("{entry_name}/{}", kind.name_from_entry(&child_name)),
                    path: child,
                    entry: child_entry,
                });
            }
            continue;
        }

        entries.push(ScannedEntry {
            kind,
            name: kind.name_from_entry(&entry_name).to_string(),
            path,
            entry,
        });
    }

    Ok(entries)
}

fn classify(path: &Path) -> Result<EntryType> {
    let meta = fs::symlink_metadata(path).with_context(|| format!("Failed to stat {}", path.display()))?;
    if meta.file_type().is_symlink() {
        return Ok(match fs::read_link(path) {
            Ok(target) => EntryType::Link(target),
            Err(e) => EntryType::UnreadableLink(e.to_string()),
        });
    }
    Ok(if meta.is_dir() { EntryType::Dir } else { EntryType::File })
}

fn read_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))? {
        let path = entry?.path();
        if !file_name(&path).starts_with('.') {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}
