//! Core types and error handling for aimgr
//!
//! This module holds the pieces every other module builds on:
//!
//! - [`AimgrError`] and [`ErrorContext`] for typed, user-friendly errors
//! - [`ResourceKind`] and [`ResourceId`] describing resource identity and layout
//!
//! # Examples
//!
//! ```rust
//! use aimgr::core::{ResourceId, ResourceKind};
//!
//! let id = ResourceId::new(ResourceKind::Skill, "pdf-processing");
//! assert_eq!(id.to_string(), "skill/pdf-processing");
//! assert_eq!(ResourceKind::Skill.plural(), "skills");
//! ```

pub mod error;
mod resource;

pub use error::{AimgrError, ErrorContext, user_friendly_error};
pub use resource::{PayloadShape, ResourceId, ResourceKind};
