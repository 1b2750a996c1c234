//! Install command

use std::path::PathBuf;

use anyhow::Result;

use quarry::core::manifest::OptionValue;
use quarry::core::settings::parse_assignment;
use quarry::ops::install::{self, InstallRequest};

/// Flags shared by the commands that resolve a recipe.
pub struct ResolveFlags {
    pub profile: Option<PathBuf>,
    pub settings: Vec<String>,
    pub options: Vec<String>,
}

/// Build an [`InstallRequest`] from command-line flags.
pub fn request(dir: PathBuf, flags: ResolveFlags, frozen: bool, dry_run: bool) -> Result<InstallRequest> {
    let mut settings = Vec::with_capacity(flags.settings.len());
    for raw in &flags.settings {
        settings.push(parse_assignment(raw)?);
    }

    let mut options = Vec::with_capacity(flags.options.len());
    for raw in &flags.options {
        let (name, value) = parse_assignment(raw)?;
        options.push((name, OptionValue::parse_cli(&value)));
    }

    Ok(InstallRequest {
        recipe_dir: dir,
        out_dir: None,
        profile: flags.profile,
        settings,
        options,
        frozen,
        dry_run,
    })
}

/// Resolve a recipe, emit generator files, and write the lockfile.
pub fn install(
    dir: PathBuf,
    out_dir: Option<PathBuf>,
    flags: ResolveFlags,
    frozen: bool,
    dry_run: bool,
) -> Result<()> {
    let mut req = request(dir, flags, frozen, dry_run)?;
    req.out_dir = out_dir;

    let outcome = install::install(&req)?;
    let ctx = &outcome.ctx;

    println!("🔧 {}/{}", ctx.recipe.name(), ctx.recipe.version());
    println!("   settings: {}", ctx.settings);
    if !ctx.options.is_empty() {
        let options: Vec<String> = ctx
            .options
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        println!("   options:  {}", options.join(", "));
    }

    if ctx.graph.is_empty() {
        println!("No dependencies to resolve.");
    } else {
        for dep in &ctx.graph {
            println!("  {} {} ({})", dep.name, dep.version, dep.root.display());
        }
    }

    if dry_run {
        println!("Dry run: no files written.");
        return Ok(());
    }

    for path in &outcome.generated {
        println!("  generated {}", path.display());
    }
    println!("🔒 Wrote {}", outcome.lockfile.display());

    Ok(())
}
