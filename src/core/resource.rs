//! Resource kinds and their storage layout.
//!
//! [`ResourceKind`] is the closed set of resource kinds. Everything that
//! differs between kinds (directory names, payload shape, link naming) is
//! expressed as data on the variant so callers select the kind once and never
//! branch on it again.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::{MARKDOWN_EXTENSION, SKILL_ENTRY_FILE};
use crate::core::AimgrError;

/// Shape of a resource payload on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// A single markdown file named `<name>.md`.
    MarkdownFile,
    /// A directory named `<name>` containing an entry file.
    Directory {
        /// File inside the directory that carries the frontmatter.
        entry_file: &'static str,
    },
}

/// The kind of a stored resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Slash command, a single markdown file. Supports nested names (`api/deploy`).
    Command,
    /// Skill, a directory with a `SKILL.md` entry file.
    Skill,
    /// Agent definition, a single markdown file.
    Agent,
}

impl ResourceKind {
    /// All kinds in canonical order.
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Command, ResourceKind::Skill, ResourceKind::Agent];

    /// Singular name used in references (`command/foo`).
    #[must_use]
    pub const fn singular(&self) -> &'static str {
        match self {
            ResourceKind::Command => "command",
            ResourceKind::Skill => "skill",
            ResourceKind::Agent => "agent",
        }
    }

    /// Directory name inside the store and inside tool directories.
    #[must_use]
    pub const fn plural(&self) -> &'static str {
        match self {
            ResourceKind::Command => "commands",
            ResourceKind::Skill => "skills",
            ResourceKind::Agent => "agents",
        }
    }

    /// How the payload is laid out on disk.
    #[must_use]
    pub const fn payload_shape(&self) -> PayloadShape {
        match self {
            ResourceKind::Skill => PayloadShape::Directory {
                entry_file: SKILL_ENTRY_FILE,
            },
            ResourceKind::Command | ResourceKind::Agent => PayloadShape::MarkdownFile,
        }
    }

    /// Whether names of this kind may contain `/` namespaces.
    #[must_use]
    pub const fn allows_nested_names(&self) -> bool {
        matches!(self, ResourceKind::Command)
    }

    /// Whether the payload is a directory.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self.payload_shape(), PayloadShape::Directory { .. })
    }

    /// File or directory name of a resource `name` of this kind.
    ///
    /// Used both for the store payload and for the link inside a tool directory.
    #[must_use]
    pub fn entry_name(&self, name: &str) -> String {
        match self.payload_shape() {
            PayloadShape::MarkdownFile => format!("{name}.{MARKDOWN_EXTENSION}"),
            PayloadShape::Directory { .. } => name.to_string(),
        }
    }

    /// Path of resource `name` below `base` (a store root or a tool kind directory).
    ///
    /// Nested command names become subdirectories.
    #[must_use]
    pub fn entry_path(&self, base: &Path, name: &str) -> PathBuf {
        let mut path = base.to_path_buf();
        for segment in self.entry_name(name).split('/') {
            path.push(segment);
        }
        path
    }

    /// Resource name for a directory entry of this kind (`deploy.md` -> `deploy`).
    #[must_use]
    pub fn name_from_entry<'a>(&self, entry: &'a str) -> &'a str {
        match self.payload_shape() {
            PayloadShape::MarkdownFile => entry
                .strip_suffix(&format!(".{MARKDOWN_EXTENSION}"))
                .unwrap_or(entry),
            PayloadShape::Directory { .. } => entry,
        }
    }

    /// Parse a kind from its singular or plural form, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "command" | "commands" => Some(ResourceKind::Command),
            "skill" | "skills" => Some(ResourceKind::Skill),
            "agent" | "agents" => Some(ResourceKind::Agent),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = AimgrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AimgrError::InvalidResourceType {
            resource_type: s.to_string(),
        })
    }
}

/// Identity of a stored resource: `(kind, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    /// Resource kind
    pub kind: ResourceKind,
    /// Validated resource name
    pub name: String,
}

impl ResourceId {
    /// Create an identifier without validating the name.
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_layout() {
        assert_eq!(ResourceKind::Command.plural(), "commands");
        assert_eq!(ResourceKind::Skill.plural(), "skills");
        assert_eq!(ResourceKind::Agent.plural(), "agents");

        assert_eq!(ResourceKind::Command.entry_name("deploy"), "deploy.md");
        assert_eq!(ResourceKind::Skill.entry_name("pdf"), "pdf");
        assert_eq!(ResourceKind::Agent.entry_name("reviewer"), "reviewer.md");
        assert!(ResourceKind::Skill.is_directory());
        assert!(!ResourceKind::Agent.is_directory());
    }

    #[test]
    fn test_entry_path_nested_command() {
        let base = Path::new("/repo/commands");
        assert_eq!(
            ResourceKind::Command.entry_path(base, "api/deploy"),
            PathBuf::from("/repo/commands/api/deploy.md")
        );
        assert_eq!(ResourceKind::Skill.entry_path(Path::new("/repo/skills"), "pdf"), PathBuf::from("/repo/skills/pdf"));
    }

    #[test]
    fn test_name_from_entry() {
        assert_eq!(ResourceKind::Command.name_from_entry("deploy.md"), "deploy");
        assert_eq!(ResourceKind::Agent.name_from_entry("notes.txt"), "notes.txt");
        assert_eq!(ResourceKind::Skill.name_from_entry("pdf.md"), "pdf.md");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(ResourceKind::from_str("command").unwrap(), ResourceKind::Command);
        assert_eq!(ResourceKind::from_str("Skills").unwrap(), ResourceKind::Skill);
        assert_eq!(ResourceKind::from_str("AGENT").unwrap(), ResourceKind::Agent);
        assert!(ResourceKind::from_str("package").is_err());
        assert!(ResourceKind::from_str("snippet").is_err());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ResourceKind::Skill).unwrap();
        assert_eq!(json, "\"skill\"");
        let kind: ResourceKind = serde_json::from_str("\"agent\"").unwrap();
        assert_eq!(kind, ResourceKind::Agent);
    }

    #[test]
    fn test_resource_id_display_and_order() {
        let a = ResourceId::new(ResourceKind::Skill, "b");
        let b = ResourceId::new(ResourceKind::Command, "z");
        assert_eq!(a.to_string(), "skill/b");
        assert!(b < a);
    }
}
