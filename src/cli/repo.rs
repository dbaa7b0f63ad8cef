//! `aimgr repo`: managing the resource repository.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::CliConfig;
use super::common::{CommandContext, OutputFormat, expand_selectors, finish_batch, print_json};
use crate::core::AimgrError;
use crate::metadata::{SOURCE_TYPE_MANUAL, SourceInfo};
use crate::pattern::{Selector, SelectorKind};
use crate::repository::{BulkImportOptions, ImportMode, discover};
use crate::resource::{Package, Reference, Resource};

#[derive(Args)]
pub struct RepoCommand {
    #[command(subcommand)]
    command: RepoSubcommand,
}

#[derive(Subcommand)]
enum RepoSubcommand {
    /// Import resources from files or directories.
    ///
    /// A directory is searched for commands/, skills/, agents/ and packages/;
    /// a directory holding SKILL.md is imported as one skill.
    Import(ImportArgs),

    /// List stored resources and packages.
    List(ListArgs),

    /// Remove resources or packages from the repository.
    Remove(RemoveArgs),

    /// Create a package from resources already in the repository.
    ///
    /// Every resource must exist when the package is created.
    CreatePackage(CreatePackageArgs),

    /// Check stored resources against their metadata.
    Verify(VerifyArgs),
}

#[derive(Args)]
struct ImportArgs {
    /// Files or directories to import.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Replace resources that already exist.
    #[arg(long, conflicts_with = "skip_existing")]
    force: bool,

    /// Leave existing resources alone instead of failing.
    #[arg(long)]
    skip_existing: bool,

    /// Show what would be imported without changing the repository.
    #[arg(long)]
    dry_run: bool,

    /// Link to the source instead of copying it.
    #[arg(long)]
    symlink: bool,

    /// Source name recorded in metadata.
    #[arg(long)]
    source_name: Option<String>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Args)]
struct ListArgs {
    /// Only show items matching this selector (e.g. `skill/*`).
    selector: Option<String>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Args)]
struct RemoveArgs {
    /// Selectors of resources or packages to remove.
    #[arg(required = true)]
    selectors: Vec<String>,
}

#[derive(Args)]
struct CreatePackageArgs {
    /// Package name.
    name: String,

    /// Member references in type/name form (e.g. `skill/pdf`).
    #[arg(required = true)]
    resources: Vec<String>,

    /// What the package is for.
    #[arg(long)]
    description: String,

    /// Replace a package with the same name.
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct VerifyArgs {
    /// Only check resources matching this selector.
    selector: Option<String>,

    /// Create missing metadata and delete orphaned metadata.
    #[arg(long)]
    fix: bool,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct RepoListing<'a> {
    resources: Vec<&'a Resource>,
    packages: Vec<&'a Package>,
}

impl RepoCommand {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = CommandContext::new(config)?;
        match self.command {
            RepoSubcommand::Import(args) => import(&ctx, args),
            RepoSubcommand::List(args) => list(&ctx, &args),
            RepoSubcommand::Remove(args) => remove(&ctx, &args),
            RepoSubcommand::CreatePackage(args) => create_package(&ctx, args),
            RepoSubcommand::Verify(args) => verify(&ctx, &args),
        }
    }
}

fn import(ctx: &CommandContext, args: ImportArgs) -> Result<()> {
    let mut candidates = Vec::new();
    for path in &args.paths {
        if !path.exists() {
            return Err(AimgrError::FileSystemError {
                operation: "import".to_string(),
                path: path.display().to_string(),
            }
            .into());
        }
        candidates.extend(discover(path));
    }

    if candidates.is_empty() {
        return Err(AimgrError::Other {
            message: "No resources found to import".to_string(),
        }
        .into());
    }

    let options = BulkImportOptions {
        force: args.force,
        skip_existing: args.skip_existing,
        dry_run: args.dry_run,
        import_mode: if args.symlink { ImportMode::Symlink } else { ImportMode::Copy },
        source_name: args.source_name,
        ..BulkImportOptions::default()
    };

    let _lock = if args.dry_run { None } else { Some(ctx.lock()?) };
    let result = ctx.repo.add_bulk(&candidates, &options)?;

    if args.format == OutputFormat::Json {
        print_json(&result)?;
    } else {
        let verb = if args.dry_run { "Would add" } else { "Added" };
        for id in &result.added {
            println!("  {} {verb} {id}", "✓".green());
        }
        for id in &result.updated {
            println!("  {} Updated {id}", "✓".green());
        }
        for id in &result.skipped {
            println!("  {} Skipped {id} (already exists)", "-".dimmed());
        }
        println!(
            "\n{} commands, {} skills, {} agents, {} packages; {} failed",
            result.command_count,
            result.skill_count,
            result.agent_count,
            result.package_count,
            result.failed.len()
        );
    }

    let failures: Vec<(String, String)> = result
        .failed
        .iter()
        .map(|f| (f.path.display().to_string(), f.message.clone()))
        .collect();
    finish_batch("import", result.succeeded() + result.skipped.len(), &failures)
}

fn list(ctx: &CommandContext, args: &ListArgs) -> Result<()> {
    let selector = args.selector.as_deref().map(Selector::parse).transpose()?;
    let resources = ctx.repo.list(None)?;
    let packages = ctx.repo.list_packages()?;

    let resources: Vec<&Resource> = match &selector {
        Some(selector) => selector.filter(&resources),
        None => resources.iter().collect(),
    };
    let packages: Vec<&Package> = packages
        .iter()
        .filter(|p| {
            selector
                .as_ref()
                .is_none_or(|s| s.matches(SelectorKind::Package, &p.name))
        })
        .collect();

    if args.format == OutputFormat::Json {
        return print_json(&RepoListing { resources, packages });
    }

    if resources.is_empty() && packages.is_empty() {
        println!("No resources found.");
        return Ok(());
    }

    let width = resources
        .iter()
        .map(|r| r.id().to_string().len())
        .chain(packages.iter().map(|p| p.name.len() + "package/".len()))
        .max()
        .unwrap_or(0);

    for resource in &resources {
        println!(
            "{:<width$}  {}",
            resource.id().to_string().bold(),
            resource.description,
        );
    }
    for package in &packages {
        println!(
            "{:<width$}  {} ({} resources)",
            format!("package/{}", package.name).bold(),
            package.description,
            package.resources.len()
        );
    }
    Ok(())
}

fn remove(ctx: &CommandContext, args: &RemoveArgs) -> Result<()> {
    let universe = ctx.repo.candidates()?;
    let (references, mut failures) = expand_selectors(&args.selectors, &universe);

    let _lock = ctx.lock()?;
    let mut removed = 0;
    for reference in references {
        let outcome = match Reference::parse(&reference) {
            Ok(Reference::Resource(id)) => ctx.repo.remove(id.kind, &id.name),
            Ok(Reference::Package(name)) => ctx.repo.remove_package(&name),
            Err(e) => Err(e.into()),
        };
        match outcome {
            Ok(()) => {
                println!("  {} Removed {reference}", "✓".green());
                removed += 1;
            }
            Err(e) => failures.push((reference, format!("{e:#}"))),
        }
    }

    finish_batch("remove", removed, &failures)
}

fn create_package(ctx: &CommandContext, args: CreatePackageArgs) -> Result<()> {
    let mut resources: Vec<String> = Vec::new();
    for reference in args.resources {
        if !resources.contains(&reference) {
            resources.push(reference);
        }
    }

    let package = Package::new(args.name, args.description, resources);
    let source = SourceInfo {
        source_type: SOURCE_TYPE_MANUAL.to_string(),
        ..SourceInfo::default()
    };

    let _lock = ctx.lock()?;
    ctx.repo.init()?;
    ctx.repo.add_package(&package, &source, args.force)?;

    println!(
        "{} Created package/{} ({} resources)",
        "✓".green(),
        package.name,
        package.resources.len()
    );
    for reference in &package.resources {
        println!("  - {reference}");
    }
    Ok(())
}

fn verify(ctx: &CommandContext, args: &VerifyArgs) -> Result<()> {
    let selector = args.selector.as_deref().map(Selector::parse).transpose()?;

    let _lock = if args.fix { Some(ctx.lock()?) } else { None };
    let report = ctx.repo.check_integrity(selector.as_ref(), args.fix)?;

    if args.format == OutputFormat::Json {
        print_json(&report)?;
    } else if report.is_clean() {
        println!("{} Repository is consistent", "✓".green());
    } else {
        for issue in &report.issues {
            let marker = if issue.is_error() { "✗".red() } else { "⚠".yellow() };
            println!("  {marker} {}", issue.describe());
        }
        if args.fix {
            println!("\nFixed {} metadata record(s)", report.fixed);
        }
    }

    if report.has_errors() && !args.fix {
        return Err(AimgrError::Other {
            message: "Repository has integrity errors; run 'aimgr repo verify --fix'".to_string(),
        }
        .into());
    }
    Ok(())
}
