//! Global constants used throughout the aimgr codebase.
//!
//! File names, directory names, limits and lock timing parameters that are
//! shared by several modules live here so the layout of the store and of a
//! project is described in exactly one place.

use std::time::Duration;

/// Name of the per-project manifest file.
pub const MANIFEST_FILE_NAME: &str = "ai.package.yaml";

/// Entry file every skill directory must contain.
pub const SKILL_ENTRY_FILE: &str = "SKILL.md";

/// Extension of single-file resources (commands and agents).
pub const MARKDOWN_EXTENSION: &str = "md";

/// Suffix of package documents inside `<repo>/packages/`.
pub const PACKAGE_FILE_SUFFIX: &str = ".package.json";

/// Suffix of metadata records inside `<repo>/.metadata/`.
pub const METADATA_FILE_SUFFIX: &str = "-metadata.json";

/// Directory holding package documents.
pub const PACKAGES_DIR: &str = "packages";

/// Directory holding metadata records, mirroring resource identity.
pub const METADATA_DIR: &str = ".metadata";

/// Directory holding advisory lock files.
pub const LOCKS_DIR: &str = ".locks";

/// Maximum length of a single name segment.
pub const MAX_NAME_LENGTH: usize = 64;

/// Maximum length of a skill description.
pub const MAX_SKILL_DESCRIPTION_LENGTH: usize = 1024;

/// Tool name used on issues that are not tied to a single tool.
pub const ANY_TOOL: &str = "any";

/// Environment variable overriding the repository location.
pub const REPO_PATH_ENV: &str = "AIMGR_REPO_PATH";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "AIMGR_CONFIG";

/// Default timeout for repository lock acquisition (30 seconds).
///
/// Every mutating command holds the lock for the duration of a single CLI
/// invocation, which is normally well below a second.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum backoff delay for exponential backoff (500ms).
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Starting delay for exponential backoff (10ms).
///
/// Doubles on each retry attempt until [`MAX_BACKOFF_DELAY_MS`] is reached.
pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;
