//! Repository-level file locking for mutating commands.
//!
//! A [`RepoLock`] is an advisory exclusive lock on `<repo>/.locks/<name>.lock`
//! held for the duration of one mutating CLI invocation (import, remove,
//! install, uninstall, repair, clean). Readers such as `list` and `verify`
//! do not lock.
//!
//! Acquisition retries with exponential backoff (10ms doubling to 500ms) until
//! the timeout elapses. The lock is released on drop. The lock file stays in
//! place so every waiter contends on the same inode.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::constants::{DEFAULT_LOCK_TIMEOUT, LOCKS_DIR};
use crate::core::AimgrError;
use crate::utils::backoff::backoff_delay;

/// Name of the lock guarding the whole repository.
pub const REPO_LOCK_NAME: &str = "repo";

/// Held exclusive lock; released on drop.
#[derive(Debug)]
pub struct RepoLock {
    file: File,
    lock_name: String,
    lock_path: PathBuf,
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(lock_name = %self.lock_name, error = %e, "Failed to unlock repository lock");
        }
        debug!(lock_name = %self.lock_name, "Repository lock released");
    }
}

impl RepoLock {
    /// Acquire `lock_name` in `repo_root` with the default timeout.
    pub fn acquire(repo_root: &Path, lock_name: &str) -> Result<Self> {
        Self::acquire_with_timeout(repo_root, lock_name, DEFAULT_LOCK_TIMEOUT)
    }

    /// Acquire `lock_name` in `repo_root`, giving up after `timeout`.
    pub fn acquire_with_timeout(repo_root: &Path, lock_name: &str, timeout: Duration) -> Result<Self> {
        debug!(lock_name = %lock_name, "Waiting for repository lock");

        let locks_dir = repo_root.join(LOCKS_DIR);
        std::fs::create_dir_all(&locks_dir)
            .with_context(|| format!("Failed to create locks directory: {}", locks_dir.display()))?;

        let lock_path = locks_dir.join(format!("{lock_name}.lock"));
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

        let start = Instant::now();
        let mut attempt = 0u32;

        loop {
            if let Ok(true) = file.try_lock_exclusive() {
                debug!(
                    lock_name = %lock_name,
                    wait_ms = start.elapsed().as_millis(),
                    "Repository lock acquired"
                );
                return Ok(Self {
                    file,
                    lock_name: lock_name.to_string(),
                    lock_path,
                });
            }

            let remaining = timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                return Err(AimgrError::LockTimeout {
                    name: lock_name.to_string(),
                }
                .into());
            }

            std::thread::sleep(backoff_delay(attempt).min(remaining));
            attempt = attempt.saturating_add(1);
        }
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_acquire_and_release() {
        let temp_dir = TempDir::new().unwrap();

        let lock = RepoLock::acquire(temp_dir.path(), "test").unwrap();
        let lock_path = temp_dir.path().join(".locks").join("test.lock");
        assert!(lock_path.exists());
        assert_eq!(lock.path(), lock_path);

        drop(lock);
        assert!(lock_path.exists());
    }

    #[test]
    fn test_waiter_and_newcomer_share_one_lock_file() {
        let temp_dir = TempDir::new().unwrap();

        let first = RepoLock::acquire(temp_dir.path(), "shared").unwrap();
        // A waiter that opened the file while the lock was held
        let waiter = OpenOptions::new().write(true).open(first.path()).unwrap();
        drop(first);

        let _newcomer = RepoLock::acquire_with_timeout(temp_dir.path(), "shared", Duration::from_millis(50)).unwrap();
        assert!(!waiter.try_lock_exclusive().unwrap());
    }

    #[test]
    fn test_lock_times_out_while_held() {
        let temp_dir = TempDir::new().unwrap();

        let _held = RepoLock::acquire(temp_dir.path(), "busy").unwrap();
        let err = RepoLock::acquire_with_timeout(temp_dir.path(), "busy", Duration::from_millis(50))
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<AimgrError>(), Some(AimgrError::LockTimeout { .. })));
    }

    #[test]
    fn test_lock_reacquire_after_release() {
        let temp_dir = TempDir::new().unwrap();

        drop(RepoLock::acquire(temp_dir.path(), "again").unwrap());
        let lock = RepoLock::acquire_with_timeout(temp_dir.path(), "again", Duration::from_millis(50));
        assert!(lock.is_ok());
    }
}
