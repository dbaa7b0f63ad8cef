//! `aimgr install`: linking resources and packages into the project.
//!
//! With selectors, every matched resource or package is installed and, unless
//! `--no-save` is given, recorded in `ai.package.yaml`. Without selectors the
//! manifest is read and everything it declares is installed.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::debug;

use super::CliConfig;
use super::common::{CommandContext, expand_selectors, finish_batch};
use crate::core::AimgrError;
use crate::installer::{Installer, LinkAction};
use crate::manifest::Manifest;
use crate::repository::Repository;
use crate::resource::Reference;

#[derive(Args)]
pub struct InstallCommand {
    /// Resources or packages to install (`skill/pdf`, `'command/*'`, `package/web`).
    selectors: Vec<String>,

    /// Tools to install into (claude, opencode, copilot); repeatable.
    #[arg(long = "target", value_name = "TOOL")]
    targets: Vec<String>,

    /// Do not record installed references in ai.package.yaml.
    #[arg(long)]
    no_save: bool,
}

impl InstallCommand {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = CommandContext::new(config)?;
        let manifest_path = Manifest::path_in(&ctx.project_dir);

        let (references, mut failures) = if self.selectors.is_empty() {
            let manifest = Manifest::load(&manifest_path)?;
            if manifest.resources.is_empty() {
                println!("Nothing to install: {} declares no resources", manifest_path.display());
                return Ok(());
            }
            (manifest.resources, Vec::new())
        } else {
            expand_selectors(&self.selectors, &ctx.repo.candidates()?)
        };

        let installer = ctx.installer(&self.targets)?;
        if installer.targets().is_empty() {
            return Err(AimgrError::ConfigError {
                message: "No install targets; pass --target or set install.targets".to_string(),
            }
            .into());
        }
        debug!("Installing {} reference(s) into {:?}", references.len(), installer.targets());

        let _lock = ctx.lock()?;
        let mut installed = Vec::new();
        for reference in references {
            match install_reference(&installer, &ctx.repo, &reference) {
                Ok(()) => installed.push(reference),
                Err(e) => failures.push((reference, format!("{e:#}"))),
            }
        }

        if !self.no_save && !self.selectors.is_empty() && !installed.is_empty() {
            let mut manifest = Manifest::load_or_default(&manifest_path)?;
            for reference in &installed {
                manifest.add(reference)?;
            }
            manifest.save(&manifest_path)?;
            debug!("Recorded {} reference(s) in {}", installed.len(), manifest_path.display());
        }

        println!("\nInstalled {} of {} item(s)", installed.len(), installed.len() + failures.len());
        finish_batch("install", installed.len(), &failures)
    }
}

/// Install one reference, printing per-tool outcomes.
fn install_reference(installer: &Installer, repo: &Repository, reference: &str) -> Result<()> {
    match Reference::parse(reference)? {
        Reference::Resource(id) => {
            let outcomes = installer.install(repo, &id)?;
            if outcomes.is_empty() {
                anyhow::bail!("none of the target tools supports {}s", id.kind);
            }
            for outcome in &outcomes {
                match outcome.action {
                    LinkAction::Created | LinkAction::Replaced(_) => {
                        println!("  {} {id} -> {}", "✓".green(), outcome.tool);
                    }
                    LinkAction::Unchanged => {
                        println!("  {} {id} already installed in {}", "-".dimmed(), outcome.tool);
                    }
                    LinkAction::Occupied => println!(
                        "  {} {id}: {} is not a link; left untouched",
                        "⚠".yellow(),
                        outcome.path.display()
                    ),
                }
            }
            if outcomes.iter().all(|o| o.action == LinkAction::Occupied) {
                anyhow::bail!("every target path is occupied by a file or directory");
            }
            Ok(())
        }
        Reference::Package(name) => {
            let report = installer.install_package(repo, &name)?;
            for member in &report.installed {
                println!("  {} {member} (package/{name})", "✓".green());
            }
            for (member, reason) in &report.failed {
                println!("  {} {member} (package/{name}): {reason}", "✗".red());
            }
            println!(
                "  package/{name}: {} installed, {} already installed, {} failed",
                report.installed.len(),
                report.skipped.len(),
                report.failed.len()
            );
            if report.installed.is_empty() && report.skipped.is_empty() && !report.failed.is_empty() {
                anyhow::bail!("no member of package/{name} could be installed");
            }
            Ok(())
        }
    }
}
