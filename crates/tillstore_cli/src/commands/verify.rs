//! Verify and clean command implementations.

use crate::error::CliError;
use tillstore_core::DataManager;

/// Runs the verify command.
///
/// Fails when any collection holds duplicate ids, so scripts can react to
/// the exit status.
pub fn run(store: &DataManager) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying store...");
    println!();

    let report = store.verify_integrity();
    println!("{report}");
    println!();

    if report.is_clean() {
        println!("✓ No duplicate records");
        Ok(())
    } else {
        Err(CliError::DuplicatesFound(report.total_duplicates()).into())
    }
}

/// Runs the clean command.
pub fn clean(store: &DataManager) -> Result<(), Box<dyn std::error::Error>> {
    let report = store.clean_duplicates()?;

    if report.total_removed() == 0 {
        println!("✓ Nothing to clean");
        return Ok(());
    }

    println!("✓ Removed {} duplicate record(s)", report.total_removed());
    for (kind, removed) in &report.removed {
        println!("  {kind}: {removed}");
    }
    store.flush()?;

    Ok(())
}
