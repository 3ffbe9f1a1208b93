//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the CLI itself, before or around store operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Another process holds the store directory.
    #[error("store at {} is in use by another process", .0.display())]
    StoreLocked(PathBuf),

    /// A command argument is not valid JSON.
    #[error("invalid JSON argument: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The integrity check found duplicate records.
    #[error("{0} duplicate record(s) found; run `tillstore clean` to remove them")]
    DuplicatesFound(usize),
}
