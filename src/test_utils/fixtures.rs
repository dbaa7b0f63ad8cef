//! Fixture builders for repositories and projects.
//!
//! Source files are written into a scratch directory next to the store and
//! then imported through the public [`Repository`] API, so fixtures go through
//! the same validation as real imports.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::core::ResourceKind;
use crate::manifest::Manifest;
use crate::metadata::SourceInfo;
use crate::repository::{AddOptions, Repository};
use crate::resource::{Package, Resource};
use crate::tools::Tool;

/// Write `<dir>/commands/<name>.md`; `name` may contain `/` namespaces.
pub fn write_command(dir: &Path, name: &str, description: &str) -> Result<PathBuf> {
    let path = dir.join("commands").join(format!("{name}.md"));
    write_markdown(&path, description, "Run the command.")?;
    Ok(path)
}

/// Write `<dir>/skills/<name>/SKILL.md`.
pub fn write_skill(dir: &Path, name: &str, description: &str) -> Result<PathBuf> {
    let skill_dir = dir.join("skills").join(name);
    let content = format!("---\nname: {name}\ndescription: {description}\n---\n\n# {name}\n");
    fs::create_dir_all(&skill_dir)?;
    fs::write(skill_dir.join("SKILL.md"), content)
        .with_context(|| format!("Failed to write skill {}", skill_dir.display()))?;
    Ok(skill_dir)
}

/// Write `<dir>/agents/<name>.md`.
pub fn write_agent(dir: &Path, name: &str, description: &str) -> Result<PathBuf> {
    let path = dir.join("agents").join(format!("{name}.md"));
    write_markdown(&path, description, "You are a helpful agent.")?;
    Ok(path)
}

fn write_markdown(path: &Path, description: &str, body: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("---\ndescription: {description}\n---\n\n{body}\n"))
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// A temporary, initialised repository plus a scratch source directory.
pub struct TestRepo {
    temp: TempDir,
    repo: Repository,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let repo = Repository::new(temp.path().join("repo"));
        repo.init()?;
        fs::create_dir_all(temp.path().join("sources"))?;
        Ok(Self { temp, repo })
    }

    #[must_use]
    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.repo.root()
    }

    /// Where fixture source files are written before import.
    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        self.temp.path().join("sources")
    }

    pub fn add_command(&self, name: &str, description: &str) -> Result<Resource> {
        let source = self.source_dir();
        let path = write_command(&source, name, description)?;
        self.repo.add(
            &path,
            ResourceKind::Command,
            &AddOptions {
                command_base: Some(source.join("commands")),
                ..AddOptions::default()
            },
        )
    }

    pub fn add_skill(&self, name: &str, description: &str) -> Result<Resource> {
        let path = write_skill(&self.source_dir(), name, description)?;
        self.repo.add(&path, ResourceKind::Skill, &AddOptions::default())
    }

    pub fn add_agent(&self, name: &str, description: &str) -> Result<Resource> {
        let path = write_agent(&self.source_dir(), name, description)?;
        self.repo.add(&path, ResourceKind::Agent, &AddOptions::default())
    }

    /// Store a package; every member must already be in the repository.
    pub fn add_package(&self, name: &str, members: &[&str]) -> Result<Package> {
        let package = Package::new(
            name,
            format!("{name} bundle"),
            members.iter().map(ToString::to_string).collect(),
        );
        let source = SourceInfo::from_path(&self.source_dir().join("packages"));
        self.repo.add_package(&package, &source, false)?;
        Ok(package)
    }
}

/// A temporary project directory.
pub struct TestProject {
    temp: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        Ok(Self { temp: TempDir::new()? })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Create the tool's marker directory so it is detected.
    pub fn with_tool(self, tool: Tool) -> Result<Self> {
        fs::create_dir_all(self.path().join(tool.marker_dir()))?;
        Ok(self)
    }

    /// Write `ai.package.yaml` declaring `references`.
    pub fn with_manifest(self, references: &[&str]) -> Result<Self> {
        let mut manifest = Manifest::new();
        for reference in references {
            manifest.add(reference)?;
        }
        manifest.save(&self.manifest_path())?;
        Ok(self)
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        Manifest::path_in(self.path())
    }

    pub fn manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.manifest_path())
    }

    /// Write a regular file relative to the project root.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }
}
