//! Status command implementation.

use super::OutputFormat;
use std::path::Path;
use tillstore_core::{DataManager, SystemStatus};

/// Runs the status command.
pub fn run(
    store: &DataManager,
    path: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = store.status();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Text => print_text_output(path, &status),
    }

    Ok(())
}

fn print_text_output(path: &Path, status: &SystemStatus) {
    println!("TillStore Status");
    println!("================");
    println!();
    println!("Path:        {}", path.display());
    println!("Version:     {}", status.version);
    println!(
        "Last update: {}",
        status.last_update.as_deref().unwrap_or("never")
    );
    println!();
    println!("Records:");
    println!("  Products: {}", status.integrity.product_count);
    println!("  Clients:  {}", status.integrity.client_count);
    println!("  Sales:    {}", status.integrity.sale_count);
    println!();
    println!("Storage:");
    for usage in &status.storage_usage.keys {
        println!("  {:<12}{}", usage.key, usage);
    }
    println!(
        "  {:<12}{:.2} KB",
        "total",
        status.storage_usage.total_kilobytes()
    );

    if !status.integrity.is_clean() {
        println!();
        println!(
            "Warning: {} duplicate record(s) present",
            status.integrity.total_duplicates()
        );
    }
}
