//! `type/name` references used by manifests and packages.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::core::{AimgrError, ResourceId, ResourceKind};
use crate::resource::name::{validate_name_for, validate_package_name};

/// Reference kind tag for packages.
pub const PACKAGE_KIND: &str = "package";

/// A parsed reference: either a single resource or a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reference {
    /// `command/<name>`, `skill/<name>` or `agent/<name>`
    Resource(ResourceId),
    /// `package/<name>`
    Package(String),
}

impl Reference {
    /// Parse a `type/name` string.
    ///
    /// The name must satisfy the naming rules of its kind, so a parsed
    /// reference always maps to a path inside the store.
    pub fn parse(reference: &str) -> Result<Self, AimgrError> {
        let invalid = |reason: &str| AimgrError::InvalidReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let (kind, name) = reference
            .split_once('/')
            .ok_or_else(|| invalid("expected type/name"))?;

        if name.is_empty() {
            return Err(invalid("empty name"));
        }

        if kind == PACKAGE_KIND {
            validate_package_name(name)?;
            return Ok(Self::Package(name.to_string()));
        }

        let kind = ResourceKind::ALL
            .into_iter()
            .find(|k| k.singular() == kind)
            .ok_or_else(|| {
                invalid(&format!("invalid type '{kind}' (must be command, skill, agent or package)"))
            })?;
        validate_name_for(kind, name)?;
        Ok(Self::Resource(ResourceId::new(kind, name)))
    }

    /// Name part of the reference.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Resource(id) => &id.name,
            Self::Package(name) => name,
        }
    }

    /// Resource identity, if this is a resource reference.
    #[must_use]
    pub const fn as_resource(&self) -> Option<&ResourceId> {
        match self {
            Self::Resource(id) => Some(id),
            Self::Package(_) => None,
        }
    }
}

impl From<ResourceId> for Reference {
    fn from(id: ResourceId) -> Self {
        Self::Resource(id)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(id) => write!(f, "{id}"),
            Self::Package(name) => write!(f, "{PACKAGE_KIND}/{name}"),
        }
    }
}

impl FromStr for Reference {
    type Err = AimgrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Reference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource_reference() {
        let reference = Reference::parse("skill/pdf-processing").unwrap();
        assert_eq!(
            reference,
            Reference::Resource(ResourceId::new(ResourceKind::Skill, "pdf-processing"))
        );
        assert_eq!(reference.to_string(), "skill/pdf-processing");
    }

    #[test]
    fn test_parse_nested_command_reference() {
        let reference = Reference::parse("command/api/deploy").unwrap();
        assert_eq!(reference.name(), "api/deploy");
        assert_eq!(reference.to_string(), "command/api/deploy");
    }

    #[test]
    fn test_parse_package_reference() {
        let reference = Reference::parse("package/web-tools").unwrap();
        assert_eq!(reference, Reference::Package("web-tools".to_string()));
        assert!(reference.as_resource().is_none());
    }

    #[test]
    fn test_parse_errors() {
        let err = Reference::parse("pdf").unwrap_err();
        assert!(err.to_string().contains("expected type/name"));

        let err = Reference::parse("skill/").unwrap_err();
        assert!(err.to_string().contains("empty name"));

        let err = Reference::parse("widget/x").unwrap_err();
        assert!(err.to_string().contains("invalid type"));

        // Plural forms are accepted by selectors, not by references
        assert!(Reference::parse("skills/pdf").is_err());
    }

    #[test]
    fn test_parse_rejects_path_traversal() {
        for raw in ["skill/..", "command/../../x", "agent/.", "package/..", "command/api/../deploy"] {
            let err = Reference::parse(raw).unwrap_err();
            assert!(matches!(err, AimgrError::InvalidName { .. }), "{raw}: {err}");
        }

        assert!(matches!(
            Reference::parse("skill/api/pdf").unwrap_err(),
            AimgrError::InvalidName { .. }
        ));
        assert!(matches!(
            Reference::parse("package/web/tools").unwrap_err(),
            AimgrError::InvalidName { .. }
        ));
        assert!(Reference::parse("skill/Bad_Name").is_err());
    }
}
