//! Resource model and payload loaders.
//!
//! A [`Resource`] is a validated view of a payload on disk: a markdown file
//! for commands and agents, a directory with `SKILL.md` for skills. Loaders
//! parse the frontmatter, apply the name and description rules and collect
//! the kind-specific fields into [`ResourceDetails`].
//!
//! # Kind detection
//!
//! [`detect_kind`] classifies an arbitrary path in this order:
//! 1. directory containing `SKILL.md` -> skill (a directory without it is an error)
//! 2. `.md` file under an `agents/` or `commands/` directory -> that kind
//! 3. frontmatter with `type`, `instructions` or `capabilities` -> agent
//! 4. any other `.md` file -> command (`agent`, `model` and `allowed-tools`
//!    are command fields)

pub mod frontmatter;
pub mod name;
pub mod package;
pub mod reference;

pub use frontmatter::Frontmatter;
pub use name::{suggest_name, validate_name, validate_name_for, validate_package_name};
pub use package::Package;
pub use reference::{PACKAGE_KIND, Reference};

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::constants::{MARKDOWN_EXTENSION, MAX_SKILL_DESCRIPTION_LENGTH, SKILL_ENTRY_FILE};
use crate::core::{AimgrError, ResourceId, ResourceKind};
use crate::utils::fs::read_text_file;

const AGENT_MARKER_FIELDS: &[&str] = &["type", "instructions", "capabilities"];

/// A validated resource.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    /// Resource name; nested commands carry their namespace (`api/deploy`)
    pub name: String,
    /// Resource kind
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// Human description from frontmatter
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Payload path the resource was loaded from
    pub path: PathBuf,
    /// Kind-specific fields
    #[serde(skip)]
    pub details: ResourceDetails,
}

/// Kind-specific resource fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceDetails {
    Command {
        agent: Option<String>,
        model: Option<String>,
        allowed_tools: Vec<String>,
    },
    Skill {
        compatibility: Vec<String>,
        has_scripts: bool,
        has_references: bool,
        has_assets: bool,
    },
    Agent {
        agent_type: Option<String>,
        instructions: Option<String>,
        capabilities: Vec<String>,
    },
}

impl Resource {
    /// Identity of this resource.
    #[must_use]
    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.kind, self.name.clone())
    }
}

/// Load a command from a markdown file; the name is the file stem.
pub fn load_command(path: &Path) -> Result<Resource, AimgrError> {
    let name = markdown_stem(ResourceKind::Command, path)?;
    load_markdown(ResourceKind::Command, path, name)
}

/// Load a command whose name is its path relative to `base` without `.md`.
///
/// `base/api/deploy.md` loads as `api/deploy`.
pub fn load_command_nested(path: &Path, base: &Path) -> Result<Resource, AimgrError> {
    markdown_stem(ResourceKind::Command, path)?;
    let relative = path.strip_prefix(base).map_err(|_| {
        invalid(
            ResourceKind::Command,
            &path.display().to_string(),
            path,
            &format!("not under {}", base.display()),
        )
    })?;

    let segments: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    load_markdown(ResourceKind::Command, path, segments.join("/"))
}

/// Load an agent from a markdown file; the name is the file stem.
pub fn load_agent(path: &Path) -> Result<Resource, AimgrError> {
    let name = markdown_stem(ResourceKind::Agent, path)?;
    load_markdown(ResourceKind::Agent, path, name)
}

/// Load a skill directory.
///
/// A `name` field in `SKILL.md`, when present, must equal the directory name.
pub fn load_skill(dir: &Path) -> Result<Resource, AimgrError> {
    let dir_name = file_name(dir);
    if !dir.is_dir() {
        return Err(invalid(ResourceKind::Skill, &dir_name, dir, "skill must be a directory"));
    }

    let entry = dir.join(SKILL_ENTRY_FILE);
    if !entry.is_file() {
        return Err(invalid(
            ResourceKind::Skill,
            &dir_name,
            dir,
            &format!("directory must contain {SKILL_ENTRY_FILE}"),
        ));
    }

    let fm = read_frontmatter(ResourceKind::Skill, &dir_name, &entry)?;

    let name = fm.get_str("name").unwrap_or_else(|| dir_name.clone());
    if name != dir_name {
        return Err(invalid(
            ResourceKind::Skill,
            &name,
            dir,
            &format!("skill name '{name}' must match directory name '{dir_name}'"),
        ));
    }

    let details = ResourceDetails::Skill {
        compatibility: fm.get_list("compatibility"),
        has_scripts: dir.join("scripts").is_dir(),
        has_references: dir.join("references").is_dir(),
        has_assets: dir.join("assets").is_dir(),
    };
    build(ResourceKind::Skill, name, dir, &fm, details)
}

/// Load any resource, dispatching on [`detect_kind`].
pub fn load(path: &Path) -> Result<Resource, AimgrError> {
    match detect_kind(path)? {
        ResourceKind::Command => load_command(path),
        ResourceKind::Skill => load_skill(path),
        ResourceKind::Agent => load_agent(path),
    }
}

/// Load a resource of a known kind.
pub fn load_as(kind: ResourceKind, path: &Path) -> Result<Resource, AimgrError> {
    match kind {
        ResourceKind::Command => load_command(path),
        ResourceKind::Skill => load_skill(path),
        ResourceKind::Agent => load_agent(path),
    }
}

/// Classify a path as a resource kind.
pub fn detect_kind(path: &Path) -> Result<ResourceKind, AimgrError> {
    let display = path.display().to_string();

    if path.is_dir() {
        if path.join(SKILL_ENTRY_FILE).is_file() {
            return Ok(ResourceKind::Skill);
        }
        return Err(AimgrError::InvalidResource {
            kind: "resource".to_string(),
            name: file_name(path),
            path: display,
            reason: format!("directory does not contain {SKILL_ENTRY_FILE}"),
        });
    }

    if !path.is_file() || !has_markdown_extension(path) {
        return Err(AimgrError::InvalidResource {
            kind: "resource".to_string(),
            name: file_name(path),
            path: display,
            reason: format!("not a valid resource (must be .md file or directory with {SKILL_ENTRY_FILE})"),
        });
    }

    let normalized = display.replace('\\', "/");
    let in_dir = |dir: &str| normalized.contains(&format!("/{dir}/")) || normalized.starts_with(&format!("{dir}/"));
    if in_dir(ResourceKind::Agent.plural()) {
        return Ok(ResourceKind::Agent);
    }
    if in_dir(ResourceKind::Command.plural()) {
        return Ok(ResourceKind::Command);
    }

    let Ok(content) = std::fs::read_to_string(path) else {
        return Ok(ResourceKind::Command);
    };
    let Ok(fm) = Frontmatter::parse(&content) else {
        return Ok(ResourceKind::Command);
    };

    if fm.has_any(AGENT_MARKER_FIELDS) { Ok(ResourceKind::Agent) } else { Ok(ResourceKind::Command) }
}

fn load_markdown(kind: ResourceKind, path: &Path, name: String) -> Result<Resource, AimgrError> {
    let fm = read_frontmatter(kind, &name, path)?;

    let details = match kind {
        ResourceKind::Agent => ResourceDetails::Agent {
            agent_type: fm.get_str("type"),
            instructions: fm.get_str("instructions"),
            capabilities: fm.get_list("capabilities"),
        },
        _ => ResourceDetails::Command {
            agent: fm.get_str("agent"),
            model: fm.get_str("model"),
            allowed_tools: fm.get_list("allowed-tools"),
        },
    };
    build(kind, name, path, &fm, details)
}

fn build(
    kind: ResourceKind,
    name: String,
    path: &Path,
    fm: &Frontmatter,
    details: ResourceDetails,
) -> Result<Resource, AimgrError> {
    validate_name_for(kind, &name)?;

    let description = fm
        .get_str("description")
        .ok_or_else(|| invalid(kind, &name, path, "description cannot be empty"))?;

    if kind == ResourceKind::Skill && description.chars().count() > MAX_SKILL_DESCRIPTION_LENGTH {
        return Err(invalid(
            kind,
            &name,
            path,
            &format!(
                "skill description too long ({} chars, max {MAX_SKILL_DESCRIPTION_LENGTH})",
                description.chars().count()
            ),
        ));
    }

    Ok(Resource {
        name,
        kind,
        description,
        version: fm.get_str("version"),
        author: fm.get_str("author"),
        license: fm.get_str("license"),
        path: path.to_path_buf(),
        details,
    })
}

fn read_frontmatter(kind: ResourceKind, name: &str, path: &Path) -> Result<Frontmatter, AimgrError> {
    let content = read_text_file(path).map_err(|e| invalid(kind, name, path, &format!("{e:#}")))?;
    Frontmatter::parse(&content).map_err(|reason| invalid(kind, name, path, &reason))
}

fn markdown_stem(kind: ResourceKind, path: &Path) -> Result<String, AimgrError> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !path.is_file() {
        return Err(invalid(kind, &stem, path, "file does not exist"));
    }
    if !has_markdown_extension(path) {
        return Err(invalid(kind, &stem, path, "must be a .md file"));
    }
    Ok(stem)
}

fn has_markdown_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == MARKDOWN_EXTENSION)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn invalid(kind: ResourceKind, name: &str, path: &Path, reason: &str) -> AimgrError {
    AimgrError::InvalidResource {
        kind: kind.to_string(),
        name: name.to_string(),
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
