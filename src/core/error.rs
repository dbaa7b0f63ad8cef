//! Error handling for aimgr
//!
//! This module provides the typed error enum used across the crate and the
//! user-facing error reporting used by the CLI. The error system follows two
//! principles:
//! 1. **Strongly-typed errors** so library callers can match on failure modes
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`AimgrError`] - enumerated error types for every failure case
//! - [`ErrorContext`] - wrapper adding a suggestion and details for display
//!
//! # Error Categories
//!
//! - **Validation**: [`AimgrError::InvalidName`], [`AimgrError::InvalidResource`],
//!   [`AimgrError::InvalidReference`], [`AimgrError::InvalidPattern`]
//! - **Not found**: [`AimgrError::ResourceNotFound`], [`AimgrError::PackageNotFound`],
//!   [`AimgrError::ManifestNotFound`], [`AimgrError::NotInstalled`]
//! - **Conflict**: [`AimgrError::AlreadyExists`]
//! - **File system**: [`AimgrError::FileSystemError`], [`AimgrError::IoError`]
//!
//! Batch operations never surface per-item failures through this type; they
//! record them in their result structs and continue.
//!
//! # Examples
//!
//! ```rust,no_run
//! use aimgr::core::{AimgrError, user_friendly_error};
//!
//! let error = AimgrError::ResourceNotFound {
//!     id: "skill/pdf".to_string(),
//!     suggestion: None,
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for aimgr operations
///
/// Each variant carries the identifier or path it concerns so the message is
/// meaningful without the surrounding call stack.
#[derive(Error, Debug, Clone)]
pub enum AimgrError {
    /// A resource or package name violates the naming rules
    #[error("Invalid name '{name}': {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
        /// A corrected name, when one can be derived
        suggestion: Option<String>,
    },

    /// A resource payload failed validation
    #[error("Invalid {kind} '{name}' at {path}: {reason}")]
    InvalidResource {
        /// Resource kind as a display string
        kind: String,
        /// Resource name (or the path stem when the name is unknown)
        name: String,
        /// Path of the offending payload
        path: String,
        /// Why validation failed
        reason: String,
    },

    /// A `type/name` reference is malformed
    #[error("Invalid reference '{reference}': {reason}")]
    InvalidReference {
        /// The rejected reference string
        reference: String,
        /// Why it was rejected
        reason: String,
    },

    /// Unknown resource type string
    #[error("Invalid resource type: {resource_type} (must be command, skill or agent)")]
    InvalidResourceType {
        /// The rejected type string
        resource_type: String,
    },

    /// Selector failed to compile
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The selector as given
        pattern: String,
        /// Compilation failure
        reason: String,
    },

    /// Selector matched nothing
    #[error("No resources match '{pattern}'")]
    NoMatches {
        /// The selector as given
        pattern: String,
    },

    /// Resource does not exist in the store
    #[error("Resource '{id}' not found in repository")]
    ResourceNotFound {
        /// `kind/name` identifier
        id: String,
        /// Closest existing name, if any
        suggestion: Option<String>,
    },

    /// Package does not exist in the store
    #[error("Package '{name}' not found in repository")]
    PackageNotFound {
        /// Package name
        name: String,
    },

    /// Resource or package already present and overwrite was not requested
    #[error("'{id}' already exists in repository")]
    AlreadyExists {
        /// `kind/name` identifier
        id: String,
    },

    /// Uninstall target has no link in any tool directory
    #[error("'{id}' is not installed")]
    NotInstalled {
        /// `kind/name` identifier
        id: String,
    },

    /// Unknown tool name
    #[error("Unknown tool: {name} (must be: claude, opencode, copilot, or vscode)")]
    UnknownTool {
        /// The rejected tool name
        name: String,
    },

    /// Manifest file missing
    #[error("Manifest file {path} not found")]
    ManifestNotFound {
        /// Expected manifest path
        path: String,
    },

    /// Manifest parse error
    #[error("Invalid manifest file syntax in {file}")]
    ManifestParseError {
        /// Manifest path
        file: String,
        /// Parser message
        reason: String,
    },

    /// Manifest content validation error
    #[error("Manifest validation failed: {reason}")]
    ManifestValidationError {
        /// Why validation failed
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// File system error
    #[error("File system error: {operation}")]
    FileSystemError {
        /// The file system operation that failed
        operation: String,
        /// Path where the file system error occurred
        path: String,
    },

    /// Lock acquisition timed out
    #[error("Timeout acquiring lock '{name}'")]
    LockTimeout {
        /// Lock name
        name: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl From<std::io::Error> for AimgrError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// Carries the underlying [`AimgrError`] plus an optional suggestion (shown
/// in green) and optional details (shown in yellow).
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: AimgrError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: AimgrError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`AimgrError`] anywhere in the error chain, then common
/// [`std::io::Error`] kinds. Anything else is rendered with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(aimgr_error) = cause.downcast_ref::<AimgrError>() {
            let mut ctx = create_error_context(aimgr_error.clone());
            if cause.to_string() != error.to_string() {
                ctx.details.get_or_insert_with(|| error.to_string());
            }
            return ctx;
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(AimgrError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the repository and project directories")
                .with_details("aimgr could not read or write a file it needed");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(AimgrError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(AimgrError::Other {
        message,
    })
}

fn create_error_context(error: AimgrError) -> ErrorContext {
    match &error {
        AimgrError::InvalidName { suggestion: Some(fixed), .. } => {
            let fixed = fixed.clone();
            ErrorContext::new(error)
                .with_suggestion(format!("Try '{fixed}' instead"))
                .with_details("Names are lowercase alphanumeric with single hyphens, 1-64 characters")
        }

        AimgrError::InvalidName { .. } => ErrorContext::new(error)
            .with_details("Names are lowercase alphanumeric with single hyphens, 1-64 characters"),

        AimgrError::ResourceNotFound { suggestion: Some(similar), .. } => {
            let similar = similar.clone();
            ErrorContext::new(error).with_suggestion(format!("Did you mean '{similar}'?"))
        }

        AimgrError::ResourceNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'aimgr repo list' to see available resources, or 'aimgr repo import' to add it"),

        AimgrError::PackageNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'aimgr repo list package/*' to see available packages"),

        AimgrError::AlreadyExists { .. } => ErrorContext::new(error)
            .with_suggestion("Use --force to overwrite or --skip-existing to keep the current copy"),

        AimgrError::ManifestParseError { file, reason } => {
            let details = reason.clone();
            let suggestion = format!("Check the YAML syntax in {file}");
            ErrorContext::new(error).with_suggestion(suggestion).with_details(details)
        }

        AimgrError::InvalidReference { .. } => ErrorContext::new(error)
            .with_suggestion("References have the form type/name, e.g. skill/pdf-processing or package/web-tools"),

        AimgrError::UnknownTool { .. } => ErrorContext::new(error)
            .with_details("Supported tools: claude, opencode, copilot (alias: vscode)"),

        AimgrError::LockTimeout { .. } => ErrorContext::new(error)
            .with_suggestion("Another aimgr process is modifying the repository. Wait for it to finish and retry"),

        _ => ErrorContext::new(error),
    }
}
