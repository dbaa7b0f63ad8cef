//! `aimgr clean`: remove every repository link from the project.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::CommandContext;

#[derive(Args)]
pub struct CleanCommand {
    /// Tools to clean; defaults to every detected tool.
    #[arg(long = "target", value_name = "TOOL")]
    targets: Vec<String>,
}

impl CleanCommand {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = CommandContext::new(config)?;
        let installer = ctx.installer(&self.targets)?;

        let _lock = ctx.lock()?;
        let removed = installer.clean(&ctx.repo)?;

        for path in &removed {
            println!("  {} Removed {}", "✓".green(), path.display());
        }
        println!("Removed {} link(s)", removed.len());
        Ok(())
    }
}
