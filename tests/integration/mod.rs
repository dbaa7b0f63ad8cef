//! Integration test suite for aimgr
//!
//! End-to-end tests driving the library against real temporary repositories
//! and projects, plus CLI tests running the compiled binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **common**: Helpers for building CLI invocations
//! - **install**: Installing, uninstalling, listing and cleaning links
//! - **store**: Bulk import, removal and repository integrity
//! - **verify_repair**: Verification issues and their repair
//! - **maintenance**: Reset of unmanaged files and manifest pruning
//! - **cli**: The `aimgr` binary end to end

mod common;

#[cfg(unix)]
mod cli;
#[cfg(unix)]
mod install;
#[cfg(unix)]
mod maintenance;
mod store;
#[cfg(unix)]
mod verify_repair;
