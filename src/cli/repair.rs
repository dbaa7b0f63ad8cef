//! `aimgr repair`: fixing verification issues.
//!
//! Three modes share the command:
//!
//! - default: re-verify with packages expanded and apply [`Repairer`]
//! - `--reset`: remove unmanaged entries from tool directories
//! - `--prune-package`: drop manifest references missing from the repository
//!
//! `--dry-run` only reports; `--force` skips confirmation prompts.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::{CommandContext, OutputFormat, StdinPrompt, print_json};
use super::verify::{print_repair, print_report};
use crate::core::AimgrError;
use crate::manifest::Manifest;
use crate::repair::{
    PruneMode, PruneReport, Repairer, ResetMode, find_invalid_refs, find_unmanaged, invalid_ref_issues, prune, reset,
};
use crate::verify::{Verifier, VerifyMode};

#[derive(Args)]
pub struct RepairCommand {
    /// Remove files, directories and foreign links that aimgr does not manage.
    #[arg(long, conflicts_with = "prune_package")]
    reset: bool,

    /// Remove manifest references to resources or packages missing from the repository.
    #[arg(long)]
    prune_package: bool,

    /// Do not ask for confirmation.
    #[arg(long, conflicts_with = "dry_run")]
    force: bool,

    /// Show what would be done without changing anything.
    #[arg(long)]
    dry_run: bool,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

impl RepairCommand {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = CommandContext::new(config)?;
        let _lock = if self.dry_run { None } else { Some(ctx.lock()?) };

        if self.reset {
            self.reset(&ctx)
        } else if self.prune_package {
            self.prune_package(&ctx)
        } else {
            self.repair(&ctx)
        }
    }

    fn repair(&self, ctx: &CommandContext) -> Result<()> {
        let tools = ctx.detected_tools();
        let report = Verifier::new(&ctx.project_dir, ctx.repo.root(), tools.clone())
            .verify(&ctx.repo, VerifyMode::Repair)?;

        if self.dry_run {
            if self.format == OutputFormat::Json {
                return print_json(&report);
            }
            print_report(&report);
            return Ok(());
        }

        let result = Repairer::new(&ctx.project_dir, &ctx.repo, tools).repair(report.issues());
        if self.format == OutputFormat::Json {
            print_json(&result)?;
        } else if report.is_clean() {
            println!("{} Nothing to repair", "✓".green());
        } else {
            print_repair(&result);
        }

        if result.summary.failed > 0 {
            return Err(AimgrError::Other {
                message: format!("{} issue(s) could not be repaired", result.summary.failed),
            }
            .into());
        }
        Ok(())
    }

    fn reset(&self, ctx: &CommandContext) -> Result<()> {
        let unmanaged = find_unmanaged(&ctx.project_dir, &ctx.detected_tools(), ctx.repo.root())?;
        if unmanaged.is_empty() {
            if self.format == OutputFormat::Json {
                return print_json(&unmanaged);
            }
            println!("{} No unmanaged files found", "✓".green());
            return Ok(());
        }

        if self.format == OutputFormat::Table {
            println!("Unmanaged entries:");
            for entry in &unmanaged {
                println!("  {} {}", "-".dimmed(), entry.to_issue().description);
                println!("    {}", entry.path.display());
            }
        }

        let mut prompt = StdinPrompt;
        let mode = if self.dry_run {
            ResetMode::DryRun
        } else if self.force {
            ResetMode::Force
        } else {
            ResetMode::Interactive(&mut prompt)
        };
        let report = reset(&unmanaged, mode)?;

        if self.format == OutputFormat::Json {
            print_json(&report)?;
        } else if report.cancelled {
            println!("Cancelled");
        } else if self.dry_run {
            println!("\nWould remove {} entry(ies)", report.would_remove.len());
        } else {
            println!("\n{} Removed {} entry(ies)", "✓".green(), report.removed.len());
            for (path, reason) in &report.failed {
                eprintln!("  {} {}: {reason}", "✗".red(), path.display());
            }
        }

        if !report.failed.is_empty() && report.removed.is_empty() {
            return Err(AimgrError::Other {
                message: format!("Failed to remove {} unmanaged entry(ies)", report.failed.len()),
            }
            .into());
        }
        Ok(())
    }

    fn prune_package(&self, ctx: &CommandContext) -> Result<()> {
        let manifest_path = Manifest::path_in(&ctx.project_dir);
        let mut manifest = Manifest::load(&manifest_path)?;
        let (invalid, partial) = find_invalid_refs(&manifest, &ctx.repo);

        if self.format == OutputFormat::Table {
            for package in &partial {
                println!(
                    "  {} package/{} references missing resources: {}",
                    "⚠".yellow(),
                    package.name,
                    package.missing.join(", ")
                );
            }
            if !partial.is_empty() {
                println!("  Partial packages are kept; re-import the missing resources or edit the package.");
            }
        }

        if invalid.is_empty() {
            if self.format == OutputFormat::Json {
                return print_json(&PruneReport::default());
            }
            println!("{} No invalid references in {}", "✓".green(), manifest_path.display());
            return Ok(());
        }

        if self.format == OutputFormat::Table {
            println!("Invalid references:");
            for issue in invalid_ref_issues(&invalid, &manifest_path) {
                println!("  {} {}", "✗".red(), issue.description);
            }
        }

        let mut prompt = StdinPrompt;
        let mode = if self.dry_run {
            PruneMode::DryRun
        } else if self.force {
            PruneMode::Force
        } else {
            PruneMode::Interactive(&mut prompt)
        };
        let report = prune(&mut manifest, &manifest_path, &invalid, mode)?;

        if self.format == OutputFormat::Json {
            return print_json(&report);
        }
        if self.dry_run {
            println!("\nWould remove {} reference(s)", report.would_remove.len());
        } else {
            println!(
                "\n{} Removed {} reference(s), skipped {}",
                "✓".green(),
                report.removed.len(),
                report.skipped.len()
            );
        }
        Ok(())
    }
}
