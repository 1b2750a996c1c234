//! Info command - show a recipe's resolved configuration.

use std::path::PathBuf;

use anyhow::Result;

use super::install::{ResolveFlags, request};
use quarry::ops::install;

/// Print the recipe identity, selection, and resolved graph.
pub fn info(dir: PathBuf, flags: ResolveFlags) -> Result<()> {
    let req = request(dir, flags, false, true)?;
    let ctx = install::resolve_context(&req)?;

    println!("{}/{}", ctx.recipe.name(), ctx.recipe.version());
    if !ctx.recipe.recipe.description.is_empty() {
        println!("  {}", ctx.recipe.recipe.description);
    }
    println!("  revision:   {}", &ctx.revision[..12]);
    println!("  settings:   {}", ctx.settings);
    for (name, value) in &ctx.options {
        println!("  option:     {name}={value}");
    }
    if !ctx.recipe.recipe.generators.is_empty() {
        println!("  generators: {}", ctx.recipe.recipe.generators.join(", "));
    }

    if ctx.graph.is_empty() {
        println!("  requires:   (none)");
    } else {
        println!("  requires:");
        for dep in &ctx.graph {
            println!(
                "    {} {} (revision {})",
                dep.name,
                dep.version,
                &dep.revision[..dep.revision.len().min(12)]
            );
        }
    }

    if let Some(package) = &ctx.recipe.package {
        println!(
            "  packaging:  {} copy rule(s), libs: [{}]",
            package.copy.len(),
            package.info.libs.join(", ")
        );
    }

    Ok(())
}
