//! Resource and package name validation.
//!
//! Names are lowercase alphanumeric with single hyphens, 1-64 characters,
//! never starting or ending with a hyphen. Nested command names such as
//! `api/deploy` are validated one segment at a time.

use regex::Regex;
use std::sync::LazyLock;

use crate::constants::MAX_NAME_LENGTH;
use crate::core::{AimgrError, ResourceKind};

static NAME_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").expect("name regex is valid")
});

/// Validate a resource or package name.
///
/// Accepts nested names (`api/deploy`); use [`validate_name_for`] to also
/// enforce that only commands may be nested.
pub fn validate_name(name: &str) -> Result<(), AimgrError> {
    if name.is_empty() {
        return Err(invalid(name, "name cannot be empty"));
    }

    if name.contains("--") {
        return Err(invalid(name, "name cannot contain consecutive hyphens"));
    }

    if name.contains('/') {
        for (i, segment) in name.split('/').enumerate() {
            if segment.is_empty() {
                return Err(invalid(name, &format!("empty segment in path at position {i}")));
            }
            check_segment(name, segment)?;
        }
        return Ok(());
    }

    check_segment(name, name)
}

/// Validate a name for a specific kind; only commands accept `/` namespaces.
pub fn validate_name_for(kind: ResourceKind, name: &str) -> Result<(), AimgrError> {
    if name.contains('/') && !kind.allows_nested_names() {
        return Err(invalid(name, &format!("{kind} names cannot contain '/'")));
    }
    validate_name(name)
}

/// Validate a package name; packages never nest.
pub fn validate_package_name(name: &str) -> Result<(), AimgrError> {
    if name.contains('/') {
        return Err(invalid(name, "package names cannot contain '/'"));
    }
    validate_name(name)
}

fn check_segment(name: &str, segment: &str) -> Result<(), AimgrError> {
    if segment.len() > MAX_NAME_LENGTH {
        let reason = if segment == name {
            format!("name too long ({} chars, max {MAX_NAME_LENGTH})", segment.len())
        } else {
            format!("segment '{segment}' too long ({} chars, max {MAX_NAME_LENGTH})", segment.len())
        };
        return Err(invalid(name, &reason));
    }

    if !NAME_SEGMENT.is_match(segment) {
        let reason = if segment == name {
            "name must be lowercase alphanumeric + hyphens, cannot start/end with hyphen".to_string()
        } else {
            format!(
                "segment '{segment}' invalid: must be lowercase alphanumeric + hyphens, cannot start/end with hyphen"
            )
        };
        return Err(invalid(name, &reason));
    }

    Ok(())
}

fn invalid(name: &str, reason: &str) -> AimgrError {
    let suggestion = suggest_name(name).filter(|fixed| fixed != name);
    AimgrError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
        suggestion,
    }
}

/// Derive a valid name from an arbitrary string, if one can be derived.
///
/// Lowercases, maps every run of invalid characters and hyphens to a single
/// hyphen, trims hyphens and truncates. Slashes are kept so nested names keep
/// their namespace.
#[must_use]
pub fn suggest_name(raw: &str) -> Option<String> {
    let segments: Vec<String> = raw
        .split('/')
        .map(fix_segment)
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() { None } else { Some(segments.join("/")) }
}

fn fix_segment(segment: &str) -> String {
    let mut fixed = String::with_capacity(segment.len());
    let mut pending_hyphen = false;

    for ch in segment.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !fixed.is_empty() {
                fixed.push('-');
            }
            pending_hyphen = false;
            fixed.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    if fixed.len() > MAX_NAME_LENGTH {
        fixed.truncate(MAX_NAME_LENGTH);
        while fixed.ends_with('-') {
            fixed.pop();
        }
    }
    fixed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["a", "pdf", "pdf-processing", "a1-b2-c3", "0", &"x".repeat(64)] {
            assert!(validate_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in [
            "",
            "-pdf",
            "pdf-",
            "pdf--processing",
            "PDF",
            "pdf_processing",
            "pdf processing",
            &"x".repeat(65),
        ] {
            assert!(validate_name(name).is_err(), "{name:?} should be invalid");
        }
    }

    #[test]
    fn test_nested_names() {
        assert!(validate_name("api/deploy").is_ok());
        assert!(validate_name("api/v1/deploy").is_ok());

        let err = validate_name("api//deploy").unwrap_err();
        assert!(err.to_string().contains("empty segment"));

        let err = validate_name("api/Deploy").unwrap_err();
        assert!(err.to_string().contains("segment 'Deploy'"));
    }

    #[test]
    fn test_nested_names_only_for_commands() {
        assert!(validate_name_for(ResourceKind::Command, "api/deploy").is_ok());
        assert!(validate_name_for(ResourceKind::Skill, "api/deploy").is_err());
        assert!(validate_name_for(ResourceKind::Agent, "api/deploy").is_err());
    }

    #[test]
    fn test_invalid_name_carries_suggestion() {
        match validate_name("My_Skill").unwrap_err() {
            AimgrError::InvalidName { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("my-skill"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_suggest_name() {
        assert_eq!(suggest_name("Hello World!").as_deref(), Some("hello-world"));
        assert_eq!(suggest_name("--a--b--").as_deref(), Some("a-b"));
        assert_eq!(suggest_name("API/Deploy Now").as_deref(), Some("api/deploy-now"));
        assert_eq!(suggest_name("___"), None);
        assert_eq!(suggest_name(&"a".repeat(80)).map(|s| s.len()), Some(64));
    }
}
