//! Search command

use anyhow::Result;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;

use quarry::core::index::PackageIndex;

/// Search exported packages by name or description.
pub fn search(query: &str) -> Result<()> {
    let index = PackageIndex::load_or_default(&quarry::index_path())?;
    let matches = index.search(query);

    if matches.is_empty() {
        println!("No packages matching '{query}'.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Name", "Latest", "Description"]);
    for entry in matches {
        let latest = entry
            .latest()
            .map(|r| r.version.as_str().to_string())
            .unwrap_or_default();
        table.add_row(vec![
            entry.name.as_str().to_string(),
            latest,
            entry.description.clone(),
        ]);
    }
    println!("{table}");

    Ok(())
}
