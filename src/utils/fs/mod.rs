//! File system utilities.
//!
//! - [`dirs`]: directory creation, copying, removal and empty-directory pruning
//! - [`atomic`]: write-to-temp-then-rename writes
//! - [`formats`]: JSON, YAML and TOML file helpers
//! - [`links`]: symbolic link creation, removal and ownership checks

pub mod atomic;
pub mod dirs;
pub mod formats;
pub mod links;

pub use atomic::{atomic_write, safe_write};
pub use dirs::{copy_dir, ensure_dir, ensure_parent_dir, prune_empty_dirs, remove_dir_all};
pub use formats::{
    read_json_file, read_text_file, read_toml_file, write_json_file, write_toml_file,
    write_yaml_file,
};
pub use links::{
    absolute_link_target, create_symlink, entry_exists, is_symlink, remove_symlink,
    resolves_under_root, target_text_under_root,
};
