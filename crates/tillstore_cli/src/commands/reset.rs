//! Reset command implementation.

use std::io::{self, BufRead, Write};
use tillstore_core::{CoreError, DataManager};

/// Erases all data, asking for confirmation unless `yes` is set.
pub fn run(store: &DataManager, yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    let result = store.reset_all(|| yes || prompt());

    match result {
        Ok(()) => {
            store.flush()?;
            println!("✓ All data erased");
            Ok(())
        }
        Err(CoreError::ResetDeclined) => {
            println!("Aborted, nothing was erased");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn prompt() -> bool {
    print!("This erases ALL products, clients and sales. Type 'yes' to continue: ");
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => is_confirmation(&answer),
        Err(_) => false,
    }
}

fn is_confirmation(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}
