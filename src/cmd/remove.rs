//! Remove command - drop exported packages from the store and index.

use std::fs;
use std::io::Write;

use anyhow::{Context, Result, bail};

use quarry::core::index::PackageIndex;
use quarry::core::spec::PackageSpec;

/// Remove an exported package (or one version of it).
pub fn remove(spec: &str, yes: bool, dry_run: bool) -> Result<()> {
    let spec = PackageSpec::parse(spec)?;

    let index_path = quarry::index_path();
    let mut index = PackageIndex::load_or_default(&index_path)?;
    let Some(entry) = index.find(&spec.name) else {
        bail!("Package '{}' is not exported", spec.name);
    };

    let versions: Vec<quarry::Version> = match &spec.version {
        Some(version) => {
            if entry.find_version(version).is_none() {
                bail!("Package '{}' has no release {version}", spec.name);
            }
            vec![version.clone()]
        }
        None => entry.releases.iter().map(|r| r.version.clone()).collect(),
    };

    if dry_run {
        for version in &versions {
            println!("Would remove {}/{version}", spec.name);
        }
        return Ok(());
    }

    if !yes && !confirm(&format!("Remove {} release(s) of '{}'?", versions.len(), spec.name))? {
        println!("Aborted.");
        return Ok(());
    }

    for version in &versions {
        let path = quarry::package_store_path(&spec.name, version);
        if path.exists() {
            fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        println!("Removed {}/{version}", spec.name);
    }
    index.remove(&spec.name, spec.version.as_ref());
    index.touch();
    index.save(&index_path)?;

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
