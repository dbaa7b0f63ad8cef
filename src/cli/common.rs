//! Shared plumbing for CLI commands.

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::debug;

use super::CliConfig;
use crate::config::GlobalConfig;
use crate::core::AimgrError;
use crate::installer::Installer;
use crate::pattern::{Candidate, Selector, expand};
use crate::repair::{Confirm, PruneChoice, PruneChooser};
use crate::repository::{RepoLock, Repository, lock::REPO_LOCK_NAME};
use crate::tools::{Tool, parse_tools};
use crate::utils::absolutize;

/// Output format of reporting commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Everything a command needs: configuration, store and project directory.
#[derive(Debug)]
pub struct CommandContext {
    pub config: GlobalConfig,
    pub repo: Repository,
    /// Project root (the current directory unless overridden)
    pub project_dir: PathBuf,
}

impl CommandContext {
    /// Build the context from global flags.
    ///
    /// `--repo` beats `$AIMGR_REPO_PATH`, which beats the config file.
    pub fn new(cli: &CliConfig) -> Result<Self> {
        let config = match &cli.config_path {
            Some(path) => GlobalConfig::load_from(path)?,
            None => GlobalConfig::load()?,
        };

        let repo_root = match &cli.repo_path {
            Some(path) => absolutize(path.clone())?,
            None => absolutize(config.resolve_repo_path()?)?,
        };

        let project_dir = match &cli.project_dir {
            Some(dir) => absolutize(dir.clone())?,
            None => std::env::current_dir().context("Failed to get current directory")?,
        };

        debug!("Repository: {}, project: {}", repo_root.display(), project_dir.display());
        Ok(Self {
            config,
            repo: Repository::new(repo_root),
            project_dir,
        })
    }

    /// Exclusive repository lock for mutating commands.
    pub fn lock(&self) -> Result<RepoLock> {
        RepoLock::acquire(self.repo.root(), REPO_LOCK_NAME)
    }

    /// Installer for explicit `--target` names, or detected targets when none are given.
    pub fn installer(&self, targets: &[String]) -> Result<Installer> {
        if targets.is_empty() {
            Installer::for_project(&self.project_dir, &self.config.default_targets()?)
        } else {
            Ok(Installer::new(&self.project_dir, parse_tools(targets)?))
        }
    }

    /// Tools whose directories exist in the project.
    #[must_use]
    pub fn detected_tools(&self) -> Vec<Tool> {
        Tool::detect_existing(&self.project_dir)
    }
}

/// Expand selectors against `universe`, collecting per-selector failures.
///
/// Every result is in canonical `kind/name` form. References are
/// de-duplicated, keeping first-seen order.
pub fn expand_selectors(selectors: &[String], universe: &[Candidate]) -> (Vec<String>, Vec<(String, String)>) {
    let mut references = Vec::new();
    let mut failures = Vec::new();

    for selector in selectors {
        let canonical = expand(selector, universe).and_then(|expanded| {
            expanded
                .iter()
                .map(|entry| canonical_reference(entry, universe))
                .collect::<Result<Vec<_>, _>>()
        });
        match canonical {
            Ok(expanded) => {
                for reference in expanded {
                    if !references.contains(&reference) {
                        references.push(reference);
                    }
                }
            }
            Err(e) => failures.push((selector.clone(), e.to_string())),
        }
    }

    (references, failures)
}

/// `kind/name` form of one expanded entry.
///
/// A kind prefix is normalized to its singular form. A bare name takes the
/// first kind that has it, in command, skill, agent, package order.
fn canonical_reference(entry: &str, universe: &[Candidate]) -> Result<String, AimgrError> {
    let selector = Selector::parse(entry)?;
    if let Some(kind) = selector.kind_filter() {
        return Ok(format!("{kind}/{}", selector.body()));
    }

    universe
        .iter()
        .filter(|c| c.name == selector.body())
        .min_by_key(|c| c.kind)
        .map(Candidate::reference)
        .ok_or_else(|| AimgrError::NoMatches {
            pattern: entry.to_string(),
        })
}

/// Print failures of a batch and fail when nothing succeeded.
pub fn finish_batch(action: &str, succeeded: usize, failures: &[(String, String)]) -> Result<()> {
    for (item, reason) in failures {
        eprintln!("  {} {item}: {reason}", "✗".red());
    }

    if succeeded == 0 && !failures.is_empty() {
        return Err(AimgrError::Other {
            message: format!("Failed to {action} any of {} item(s)", failures.len()),
        }
        .into());
    }
    Ok(())
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

/// Line-based prompts on stdin.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl StdinPrompt {
    fn ask(prompt: &str) -> Result<String> {
        print!("{prompt} ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).context("Failed to read from stdin")?;
        Ok(line.trim().to_lowercase())
    }
}

impl Confirm for StdinPrompt {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = Self::ask(&format!("{prompt} [y/N]:"))?;
        Ok(answer == "y" || answer == "yes")
    }
}

impl PruneChooser for StdinPrompt {
    fn choose(&mut self, reference: &str) -> Result<PruneChoice> {
        println!("\n{} {reference} not found in repository", "⚠".yellow());
        loop {
            println!("  [1] Remove from ai.package.yaml");
            println!("  [2] Skip (do nothing)");
            match Self::ask("Choice [1-2]:")?.as_str() {
                "1" => return Ok(PruneChoice::Remove),
                // EOF reads as empty; never loop forever on closed stdin
                "2" | "" => return Ok(PruneChoice::Skip),
                _ => println!("Invalid choice, please try again."),
            }
        }
    }
}
