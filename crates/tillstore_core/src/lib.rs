//! # TillStore Core
//!
//! Data layer for a small retail point-of-sale application.
//!
//! This crate provides:
//! - A [`DataManager`] owning products, clients and sales
//! - Write-time deduplication so no collection persists two records with one id
//! - Persistent, never-reused record identifiers
//! - Sale recording that decrements product stock, floored at zero
//! - A change feed for observing collection writes
//! - Integrity checks, storage usage, cleanup, export and import
//!
//! ## Example
//!
//! ```rust
//! use tillstore_core::{CollectionKind, DataManager, Product, Sale};
//!
//! let store = DataManager::open_in_memory().unwrap();
//!
//! store.add_product(Product::new("Shirt", 10).with_id(5)).unwrap();
//! store.add_sale(Sale::new(50.0).with_item(5, 15)).unwrap();
//!
//! let shirt = store.collection(CollectionKind::Products).find(5).unwrap();
//! assert_eq!(shirt.get_i64("stock"), Some(0));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod allocator;
mod change_feed;
mod collection;
mod config;
mod diagnostics;
mod error;
mod inventory;
mod manager;
mod record;
mod transfer;
mod types;

pub use adapter::KvAdapter;
pub use allocator::IdAllocator;
pub use change_feed::{ChangeEvent, ChangeFeed, Subscription, SubscriptionId};
pub use collection::{count_duplicates, dedup_first_wins, Collection};
pub use config::{Config, QuantityPolicy, DEFAULT_ID_FLOOR};
pub use diagnostics::{CleanupReport, IntegrityReport, KeyUsage, StorageUsage, SystemStatus};
pub use error::{CoreError, CoreResult};
pub use inventory::{apply_line_items, line_items, LineItem};
pub use manager::DataManager;
pub use record::{
    records_from_value, Client, IdKey, IntoRecord, Product, Record, Sale, SaleItem,
};
pub use transfer::{ExportPayload, ImportSummary};
pub use types::{
    iso_now, CollectionKind, RecordId, SequenceNumber, CLIENTS_KEY, LAST_UPDATE_KEY,
    MANAGED_KEYS, NEXT_ID_KEY, PRODUCTS_KEY, SALES_KEY,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the persisted and exported data format.
pub const FORMAT_VERSION: &str = "2.0.0";
