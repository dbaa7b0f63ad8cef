//! Consumer tools resources are installed into.
//!
//! Each tool owns one directory per supported kind inside a project:
//!
//! | tool     | commands             | skills              | agents             |
//! |----------|----------------------|---------------------|--------------------|
//! | claude   | `.claude/commands`   | `.claude/skills`    | `.claude/agents`   |
//! | opencode | `.opencode/commands` | `.opencode/skills`  | `.opencode/agents` |
//! | copilot  | -                    | `.github/skills`    | -                  |
//!
//! `vscode` parses as an alias of copilot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::{AimgrError, ResourceKind};

/// A supported consumer tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Claude,
    #[serde(rename = "opencode")]
    OpenCode,
    #[serde(alias = "vscode")]
    Copilot,
}

impl Tool {
    /// All tools in registry order.
    pub const ALL: [Tool; 3] = [Tool::Claude, Tool::OpenCode, Tool::Copilot];

    /// All tools in registry order.
    #[must_use]
    pub fn all() -> Vec<Tool> {
        Self::ALL.to_vec()
    }

    /// Lowercase identifier.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::OpenCode => "opencode",
            Self::Copilot => "copilot",
        }
    }

    /// Human readable product name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude Code",
            Self::OpenCode => "OpenCode",
            Self::Copilot => "GitHub Copilot / VSCode",
        }
    }

    /// Project-relative directory holding links of `kind`, if supported.
    #[must_use]
    pub const fn dir_for(&self, kind: ResourceKind) -> Option<&'static str> {
        match (self, kind) {
            (Self::Claude, ResourceKind::Command) => Some(".claude/commands"),
            (Self::Claude, ResourceKind::Skill) => Some(".claude/skills"),
            (Self::Claude, ResourceKind::Agent) => Some(".claude/agents"),
            (Self::OpenCode, ResourceKind::Command) => Some(".opencode/commands"),
            (Self::OpenCode, ResourceKind::Skill) => Some(".opencode/skills"),
            (Self::OpenCode, ResourceKind::Agent) => Some(".opencode/agents"),
            (Self::Copilot, ResourceKind::Skill) => Some(".github/skills"),
            (Self::Copilot, _) => None,
        }
    }

    #[must_use]
    pub const fn supports(&self, kind: ResourceKind) -> bool {
        self.dir_for(kind).is_some()
    }

    /// Absolute kind directory inside `project`, if supported.
    #[must_use]
    pub fn kind_dir(&self, project: &Path, kind: ResourceKind) -> Option<PathBuf> {
        self.dir_for(kind).map(|dir| project.join(dir))
    }

    /// Kinds this tool supports, in kind order.
    #[must_use]
    pub fn supported_kinds(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL.into_iter().filter(|k| self.supports(*k)).collect()
    }

    /// Directory whose presence marks the tool as in use.
    ///
    /// Copilot is detected by `.github/skills` rather than `.github`, which
    /// most repositories have for unrelated reasons.
    #[must_use]
    pub const fn marker_dir(&self) -> &'static str {
        match self {
            Self::Claude => ".claude",
            Self::OpenCode => ".opencode",
            Self::Copilot => ".github/skills",
        }
    }

    /// Tools whose marker directory exists in `project`, in registry order.
    #[must_use]
    pub fn detect_existing(project: &Path) -> Vec<Tool> {
        Self::ALL
            .into_iter()
            .filter(|tool| project.join(tool.marker_dir()).is_dir())
            .collect()
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = AimgrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" => Ok(Self::Claude),
            "opencode" => Ok(Self::OpenCode),
            "copilot" | "vscode" => Ok(Self::Copilot),
            _ => Err(AimgrError::UnknownTool {
                name: s.to_string(),
            }),
        }
    }
}

/// Parse a list of tool names, failing on the first unknown one.
pub fn parse_tools<S: AsRef<str>>(names: &[S]) -> Result<Vec<Tool>, AimgrError> {
    let mut tools = Vec::new();
    for name in names {
        let tool: Tool = name.as_ref().parse()?;
        if !tools.contains(&tool) {
            tools.push(tool);
        }
    }
    Ok(tools)
}
