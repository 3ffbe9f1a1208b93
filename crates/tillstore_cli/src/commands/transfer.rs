//! Export and import commands.

use std::fs;
use std::io::Write;
use std::path::Path;
use tillstore_core::DataManager;
use tracing::info;

/// Writes every collection as one JSON document.
///
/// Goes to `output` when given, else to standard output.
pub fn export(
    store: &DataManager,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let payload = store.export_all();
    let text = serde_json::to_string_pretty(&payload)?;

    match output {
        Some(path) => {
            let mut file = fs::File::create(path)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;

            eprintln!("✓ Export written to {}", path.display());
            eprintln!("  Products: {}", payload.products.len());
            eprintln!("  Clients:  {}", payload.clients.len());
            eprintln!("  Sales:    {}", payload.sales.len());
        }
        None => println!("{text}"),
    }

    Ok(())
}

/// Replaces collections with the contents of an export file.
pub fn import(store: &DataManager, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("Importing from {:?}", input);

    let text = fs::read_to_string(input)?;
    let payload: serde_json::Value = serde_json::from_str(&text)?;
    if let Some(version) = payload.get("version").and_then(serde_json::Value::as_str) {
        if version != tillstore_core::FORMAT_VERSION {
            eprintln!(
                "Warning: export format {version} differs from {}",
                tillstore_core::FORMAT_VERSION
            );
        }
    }

    let summary = store.import_all(&payload)?;
    store.flush()?;

    println!("✓ Import complete");
    for (kind, count) in &summary.imported {
        println!("  {kind}: {count}");
    }

    Ok(())
}
