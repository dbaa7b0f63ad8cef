//! `aimgr verify`: checking installed links and the manifest.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::CliConfig;
use super::common::{CommandContext, OutputFormat, print_json};
use crate::core::AimgrError;
use crate::repair::{RepairResult, Repairer};
use crate::verify::{Issue, Severity, Verifier, VerifyMode, VerifyReport};

#[derive(Args)]
pub struct VerifyCommand {
    /// Repair what can be repaired automatically.
    #[arg(long)]
    fix: bool,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct VerifyOutput<'a> {
    issues: &'a [Issue],
    #[serde(skip_serializing_if = "Option::is_none")]
    repair: Option<&'a RepairResult>,
}

impl VerifyCommand {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = CommandContext::new(config)?;
        let tools = ctx.detected_tools();
        let verifier = Verifier::new(&ctx.project_dir, ctx.repo.root(), tools.clone());

        let report = verifier.verify(&ctx.repo, VerifyMode::Report)?;

        let repair = if self.fix && !report.is_clean() {
            let _lock = ctx.lock()?;
            let repair_issues = verifier.verify(&ctx.repo, VerifyMode::Repair)?;
            Some(Repairer::new(&ctx.project_dir, &ctx.repo, tools).repair(repair_issues.issues()))
        } else {
            None
        };

        if self.format == OutputFormat::Json {
            print_json(&VerifyOutput {
                issues: report.issues(),
                repair: repair.as_ref(),
            })?;
        } else {
            print_report(&report);
            if let Some(result) = &repair {
                print_repair(result);
            }
        }

        let unresolved = match &repair {
            Some(result) => result.summary.failed > 0,
            None => report.has_errors(),
        };
        if unresolved {
            return Err(AimgrError::Other {
                message: "Verification found errors; run 'aimgr repair' to fix them".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Print issues as a table, errors first.
pub(crate) fn print_report(report: &VerifyReport) {
    if report.is_clean() {
        println!("{} No issues found", "✓".green());
        return;
    }

    for issue in report.errors().chain(report.warnings()) {
        let marker = match issue.severity {
            Severity::Error => "✗".red(),
            Severity::Warning => "⚠".yellow(),
        };
        println!(
            "  {marker} {:<16} {:<8} {:<14} {}",
            issue.subject.to_string(),
            issue.tool,
            issue.kind.as_str(),
            issue.description
        );
    }
    println!(
        "\n{} error(s), {} warning(s)",
        report.errors().count(),
        report.warnings().count()
    );
}

/// Print the three repair buckets and a summary line.
pub(crate) fn print_repair(result: &RepairResult) {
    for action in &result.fixed {
        println!("  {} {}", "✓".green(), action.description);
    }
    for action in &result.failed {
        println!("  {} {}: {}", "✗".red(), action.resource, action.description);
    }
    for action in &result.hints {
        println!("  {} {}", "→".cyan(), action.description);
    }
    println!(
        "\nFixed {}, failed {}, {} hint(s)",
        result.summary.fixed, result.summary.failed, result.summary.hints
    );
}
