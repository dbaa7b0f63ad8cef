//! `aimgr uninstall`: removing links and manifest entries.
//!
//! Selectors are matched against both the repository and what is installed,
//! so a resource that has since left the repository can still be removed.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::{CommandContext, expand_selectors, finish_batch};
use crate::installer::{Installer, UnlinkAction};
use crate::manifest::Manifest;
use crate::pattern::Candidate;
use crate::repository::Repository;
use crate::resource::Reference;

#[derive(Args)]
pub struct UninstallCommand {
    /// Resources or packages to uninstall.
    #[arg(required = true)]
    selectors: Vec<String>,

    /// Tools to uninstall from; defaults to every detected tool.
    #[arg(long = "target", value_name = "TOOL")]
    targets: Vec<String>,

    /// Keep the references in ai.package.yaml.
    #[arg(long)]
    no_save: bool,
}

impl UninstallCommand {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = CommandContext::new(config)?;
        let installer = ctx.installer(&self.targets)?;

        let mut universe = ctx.repo.candidates()?;
        for installed in installer.list_installed(&ctx.repo)? {
            let candidate = Candidate::resource(installed.id.kind, installed.id.name);
            if !universe.contains(&candidate) {
                universe.push(candidate);
            }
        }
        let (references, mut failures) = expand_selectors(&self.selectors, &universe);

        let _lock = ctx.lock()?;
        let mut removed = Vec::new();
        for reference in references {
            match uninstall_reference(&installer, &ctx.repo, &reference) {
                Ok(()) => removed.push(reference),
                Err(e) => failures.push((reference, format!("{e:#}"))),
            }
        }

        let manifest_path = Manifest::path_in(&ctx.project_dir);
        if !self.no_save && Manifest::exists(&manifest_path) {
            let mut manifest = Manifest::load(&manifest_path)?;
            let mut changed = false;
            for reference in &removed {
                changed |= manifest.remove(reference);
            }
            if changed {
                manifest.save(&manifest_path)?;
            }
        }

        finish_batch("uninstall", removed.len(), &failures)
    }
}

fn uninstall_reference(installer: &Installer, repo: &Repository, reference: &str) -> Result<()> {
    match Reference::parse(reference)? {
        Reference::Resource(id) => {
            let outcomes = installer.uninstall(repo, &id)?;
            for outcome in &outcomes {
                match outcome.action {
                    UnlinkAction::Removed => println!("  {} Removed {id} from {}", "✓".green(), outcome.tool),
                    UnlinkAction::SkippedNotALink => println!(
                        "  {} {}: not a link; left untouched",
                        "⚠".yellow(),
                        outcome.path.display()
                    ),
                    UnlinkAction::SkippedForeign => println!(
                        "  {} {}: points outside the repository; left untouched",
                        "⚠".yellow(),
                        outcome.path.display()
                    ),
                }
            }
            if !outcomes.iter().any(|o| o.action == UnlinkAction::Removed) {
                anyhow::bail!("no link owned by the repository was found");
            }
            Ok(())
        }
        Reference::Package(name) => {
            let report = installer.uninstall_package(repo, &name)?;
            for member in &report.removed {
                println!("  {} Removed {member} (package/{name})", "✓".green());
            }
            for (member, reason) in &report.failed {
                println!("  {} {member} (package/{name}): {reason}", "✗".red());
            }
            Ok(())
        }
    }
}
