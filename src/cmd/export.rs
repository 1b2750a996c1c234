//! Export command - publish a recipe directory into the local store.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fs_extra::dir::CopyOptions;

use quarry::core::index::{PackageIndex, ReleaseInfo, Requirement};
use quarry::core::manifest::{Recipe, recipe_revision};
use quarry::core::settings::SettingsTable;

/// Export a recipe directory's tree into the store and index it.
pub fn export(dir: &Path, dry_run: bool) -> Result<()> {
    let recipe_path = dir.join(quarry::RECIPE_FILE);
    let content = fs::read_to_string(&recipe_path)
        .with_context(|| format!("Failed to read {}", recipe_path.display()))?;
    let recipe = Recipe::parse(&content)
        .with_context(|| format!("Failed to parse {}", recipe_path.display()))?;
    recipe.validate(&SettingsTable::builtin())?;

    let name = recipe.name().clone();
    let version = recipe.version().clone();
    let revision = recipe_revision(&content);
    let dest = quarry::package_store_path(&name, &version);

    if dry_run {
        println!("Would export {name}/{version} to {}", dest.display());
        return Ok(());
    }

    // Replace any previous export of the same version
    if dest.exists() {
        fs::remove_dir_all(&dest)
            .with_context(|| format!("Failed to clear {}", dest.display()))?;
    }
    fs::create_dir_all(&dest)?;

    let mut options = CopyOptions::new();
    options.overwrite = true;
    options.content_only = true;
    fs_extra::dir::copy(dir, &dest, &options)
        .with_context(|| format!("Failed to copy package tree to {}", dest.display()))?;

    let index_path = quarry::index_path();
    if let Some(parent) = index_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut index = PackageIndex::load_or_default(&index_path)?;
    index.upsert_release(
        &name,
        &recipe.recipe.description,
        ReleaseInfo {
            version: version.clone(),
            revision: revision.clone(),
            libs: recipe
                .package
                .as_ref()
                .map(|p| p.info.libs.clone())
                .unwrap_or_default(),
            requires: recipe
                .requires
                .iter()
                .map(|(name, version)| Requirement {
                    name: name.clone(),
                    version: version.clone(),
                })
                .collect(),
        },
    );
    index.touch();
    index.save(&index_path)?;

    println!("📦 Exported {name}/{version} (revision {})", &revision[..12]);
    Ok(())
}
