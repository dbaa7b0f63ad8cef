//! `aimgr list`: resources installed in the project.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::CliConfig;
use super::common::{CommandContext, OutputFormat, print_json};
use crate::installer::{InstalledResource, Installer, LinkHealth};
use crate::manifest::Manifest;

#[derive(Args)]
pub struct ListCommand {
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct ListEntry<'a> {
    #[serde(flatten)]
    installed: &'a InstalledResource,
    /// Declared in ai.package.yaml
    declared: bool,
}

impl ListCommand {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = CommandContext::new(config)?;
        let tools = ctx.detected_tools();
        let installed = Installer::new(&ctx.project_dir, tools).list_installed(&ctx.repo)?;

        let manifest = Manifest::load_or_default(&Manifest::path_in(&ctx.project_dir))?;
        let entries: Vec<ListEntry<'_>> = installed
            .iter()
            .map(|i| ListEntry {
                installed: i,
                declared: manifest.contains(&i.id.to_string()),
            })
            .collect();

        if self.format == OutputFormat::Json {
            return print_json(&entries);
        }

        if entries.is_empty() {
            println!("No installed resources found.");
            return Ok(());
        }

        let width = entries.iter().map(|e| e.installed.id.to_string().len()).max().unwrap_or(0);
        for entry in &entries {
            let status = match entry.installed.health {
                LinkHealth::Ok => "ok".green(),
                LinkHealth::Broken => "broken".red(),
            };
            let declared = if entry.declared { "" } else { " (not in manifest)" };
            println!(
                "{:<width$}  {:<8}  {status}{}",
                entry.installed.id.to_string(),
                entry.installed.tool.name(),
                declared.dimmed()
            );
        }
        Ok(())
    }
}
