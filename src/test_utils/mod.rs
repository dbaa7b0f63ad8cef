//! Test utilities for aimgr
//!
//! Helpers shared by unit tests and the integration suite: logging setup and
//! fixture builders for a populated repository and a project directory.
//!
//! # Example
//!
//! ```rust,no_run
//! use aimgr::test_utils::{TestProject, TestRepo};
//! use aimgr::tools::Tool;
//!
//! let repo = TestRepo::new().unwrap();
//! repo.add_skill("pdf", "PDF tools").unwrap();
//!
//! let project = TestProject::new().unwrap().with_tool(Tool::Claude).unwrap();
//! assert!(project.path().join(".claude").is_dir());
//! ```

pub mod fixtures;

pub use fixtures::{TestProject, TestRepo, write_agent, write_command, write_skill};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=aimgr=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
