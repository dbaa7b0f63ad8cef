//! Directory creation, copying and removal.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::trace;

/// Ensure a directory exists, creating it and its parents if needed.
///
/// Fails when the path exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Recursively copy a directory tree.
///
/// Regular files and directories are copied; symlinks inside the source are
/// skipped so a copied skill never points back outside the store.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    ensure_dir(dst)?;

    for entry in
        fs::read_dir(src).with_context(|| format!("Failed to read directory: {}", src.display()))?
    {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            fs::copy(&src_path, &dst_path).with_context(|| {
                format!("Failed to copy file from {} to {}", src_path.display(), dst_path.display())
            })?;
        } else {
            trace!("Skipping non-regular entry {}", src_path.display());
        }
    }

    Ok(())
}

/// Remove a directory tree if it exists.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Remove empty directories from `start` upwards, stopping at `stop` (exclusive).
///
/// Returns the directories that were removed.
pub fn prune_empty_dirs(start: &Path, stop: &Path) -> Vec<std::path::PathBuf> {
    let mut removed = Vec::new();
    let mut current = start.to_path_buf();

    while current.starts_with(stop) && current != stop {
        let is_empty = fs::read_dir(&current).map(|mut it| it.next().is_none()).unwrap_or(false);
        if !is_empty || fs::remove_dir(&current).is_err() {
            break;
        }
        removed.push(current.clone());
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    removed
}
