//! Symbolic link helpers.
//!
//! Installation links are always created with absolute targets. Ownership
//! checks come in two strengths:
//!
//! - [`target_text_under_root`] is the byte-prefix test used by the scanners
//!   (verify, reset): the raw link text must begin with the store root text.
//! - [`resolves_under_root`] resolves relative link text against the link's
//!   directory and compares path components; the installer uses it to decide
//!   whether an existing link is already owned by the store.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Create a symbolic link at `link` pointing to `target`.
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).with_context(|| {
            format!("Failed to create symlink {} -> {}", link.display(), target.display())
        })
    }

    #[cfg(windows)]
    {
        let result = if target.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };
        result.with_context(|| {
            format!("Failed to create symlink {} -> {}", link.display(), target.display())
        })
    }
}

/// Remove a symbolic link without following it.
pub fn remove_symlink(link: &Path) -> Result<()> {
    #[cfg(windows)]
    {
        // Directory symlinks on Windows must be removed as directories.
        if fs::remove_file(link).is_ok() {
            return Ok(());
        }
        return fs::remove_dir(link)
            .with_context(|| format!("Failed to remove symlink: {}", link.display()));
    }

    #[cfg(not(windows))]
    fs::remove_file(link).with_context(|| format!("Failed to remove symlink: {}", link.display()))
}

/// Whether `path` itself is a symbolic link (not followed).
#[must_use]
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).map(|m| m.file_type().is_symlink()).unwrap_or(false)
}

/// Whether anything (including a dangling link) exists at `path`.
#[must_use]
pub fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Absolute form of a link's target, resolving relative text against the link's directory.
#[must_use]
pub fn absolute_link_target(link: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        target.to_path_buf()
    } else {
        link.parent().map_or_else(|| target.to_path_buf(), |dir| dir.join(target))
    }
}

/// Byte-prefix ownership test on the raw link text.
#[must_use]
pub fn target_text_under_root(target: &Path, root: &Path) -> bool {
    target.as_os_str().as_encoded_bytes().starts_with(root.as_os_str().as_encoded_bytes())
}

/// Component-wise ownership test on the absolute target.
#[must_use]
pub fn resolves_under_root(link: &Path, target: &Path, root: &Path) -> bool {
    absolute_link_target(link, target).starts_with(root)
}
