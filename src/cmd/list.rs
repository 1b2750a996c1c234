//! List command

use anyhow::Result;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;

use quarry::core::index::PackageIndex;

/// List all exported packages.
pub fn list() -> Result<()> {
    let index = PackageIndex::load_or_default(&quarry::index_path())?;

    if index.packages.is_empty() {
        println!("No packages exported.");
        println!("Run 'quarry export <dir>' to publish one.");
        return Ok(());
    }

    println!(
        "📋 Exported packages (index updated {}):",
        format_updated(index.updated_at)
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Name", "Versions", "Libs", "Description"]);
    for entry in &index.packages {
        let versions: Vec<&str> = entry.releases.iter().map(|r| r.version.as_str()).collect();
        let libs = entry
            .latest()
            .map(|r| r.libs.join(", "))
            .unwrap_or_default();
        table.add_row(vec![
            entry.name.as_str().to_string(),
            versions.join(", "),
            libs,
            entry.description.clone(),
        ]);
    }
    println!("{table}");

    Ok(())
}

/// Format the index timestamp for display.
fn format_updated(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .filter(|_| timestamp > 0)
        .map_or_else(
            || "never".to_string(),
            |t| t.format("%Y-%m-%d %H:%M UTC").to_string(),
        )
}
