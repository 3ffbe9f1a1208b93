//! CLI command implementations.

pub mod records;
pub mod reset;
pub mod status;
pub mod transfer;
pub mod verify;

use clap::ValueEnum;

/// Output format of reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}
