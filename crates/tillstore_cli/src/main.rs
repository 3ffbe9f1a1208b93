//! TillStore CLI
//!
//! Command-line tools for inspecting and maintaining a TillStore data
//! directory.
//!
//! # Commands
//!
//! - `status` - Display counts, last update and storage usage
//! - `verify` - Check collections for duplicate ids
//! - `clean` - Remove duplicate records
//! - `export` / `import` - Move all data as one JSON document
//! - `reset` - Erase all data
//! - `list` / `add` / `sell` - Read and edit records

mod commands;
mod error;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use error::CliError;
use std::path::{Path, PathBuf};
use tillstore_core::{CollectionKind, Config, CoreError, DataManager};
use tillstore_storage::StorageError;
use tracing_subscriber::EnvFilter;

/// TillStore command-line data tools.
#[derive(Parser)]
#[command(name = "tillstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long, default_value = "tillstore-data")]
    path: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display record counts, last update and storage usage
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Check every collection for duplicate ids
    Verify,

    /// Remove duplicate records, keeping the first of each id
    Clean,

    /// Export all collections as JSON
    Export {
        /// Write to this file instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace collections with the contents of an export file
    Import {
        /// Export file to read
        file: PathBuf,
    },

    /// Erase all products, clients, sales and metadata
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Print all records of a collection
    List {
        /// products, clients or sales
        collection: CollectionKind,
    },

    /// Add a record, or merge it into the record with the same id
    Add {
        /// products, clients or sales
        collection: CollectionKind,

        /// The record as a JSON object
        json: String,
    },

    /// Record a sale and adjust stock
    Sell {
        /// The sale as a JSON object
        json: String,
    },

    /// Show version information
    Version,
}

/// Opens the store without start-up cleanup, so `verify` sees the data as
/// it is on disk.
fn open_store(path: &Path) -> Result<DataManager, Box<dyn std::error::Error>> {
    let config = Config::default().clean_on_open(false);
    match DataManager::open_with_config(path, config) {
        Ok(store) => Ok(store),
        Err(CoreError::Storage(StorageError::Locked)) => {
            Err(CliError::StoreLocked(path.to_path_buf()).into())
        }
        Err(e) => Err(e.into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("TillStore CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("TillStore Core v{}", tillstore_core::VERSION);
        println!("Data format v{}", tillstore_core::FORMAT_VERSION);
        return Ok(());
    }

    let store = open_store(&cli.path)?;

    match cli.command {
        Commands::Status { format } => commands::status::run(&store, &cli.path, format)?,
        Commands::Verify => commands::verify::run(&store)?,
        Commands::Clean => commands::verify::clean(&store)?,
        Commands::Export { output } => commands::transfer::export(&store, output.as_deref())?,
        Commands::Import { file } => commands::transfer::import(&store, &file)?,
        Commands::Reset { yes } => commands::reset::run(&store, yes)?,
        Commands::List { collection } => commands::records::list(&store, collection)?,
        Commands::Add { collection, json } => {
            commands::records::add(&store, collection, &json)?;
        }
        Commands::Sell { json } => commands::records::sell(&store, &json)?,
        Commands::Version => {}
    }

    Ok(())
}
