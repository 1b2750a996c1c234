//! Package command - run a recipe's staging copy rules.

use std::path::PathBuf;

use anyhow::Result;

use super::install::{ResolveFlags, request};
use quarry::ops::install;

/// Stage the recipe's packaging tree and report the link libraries.
pub fn package(dir: PathBuf, staging_dir: Option<PathBuf>, flags: ResolveFlags) -> Result<()> {
    let req = request(dir, flags, false, false)?;
    let outcome = install::stage_package(&req, staging_dir)?;

    for rule in &outcome.staged {
        let files = rule.files;
        println!(
            "  {} {} -> {}: {files} file{}",
            rule.pattern,
            rule.src,
            rule.dst,
            if files == 1 { "" } else { "s" }
        );
    }
    println!("📦 Staged into {}", outcome.staging_dir.display());
    if !outcome.libs.is_empty() {
        println!("Link libraries: {}", outcome.libs.join(", "));
    }

    Ok(())
}
