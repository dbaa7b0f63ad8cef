//! Cross-cutting utilities: file system helpers, symlinks, retry backoff and
//! path expansion.

pub mod backoff;
pub mod fs;

pub use fs::{atomic_write, copy_dir, ensure_dir, safe_write};

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Expand `~` and environment variables in a user-supplied path.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .with_context(|| format!("Failed to expand environment variables in path: {raw}"))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Make `path` absolute against the current directory without touching the file system.
pub fn absolutize(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Ok(cwd.join(path))
    }
}
