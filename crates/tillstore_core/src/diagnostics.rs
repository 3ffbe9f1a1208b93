//! Integrity checks, cleanup reports and storage usage.
//!
//! # Usage
//!
//! ```rust
//! use tillstore_core::DataManager;
//!
//! let store = DataManager::open_in_memory().unwrap();
//!
//! let status = store.status();
//! println!("Products: {}", status.integrity.product_count);
//! println!("Storage: {}", status.storage_usage);
//! assert!(status.integrity.ids_unique);
//! ```

use crate::adapter::KvAdapter;
use crate::collection::count_duplicates;
use crate::record::Record;
use crate::types::{CollectionKind, MANAGED_KEYS};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Result of an integrity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Number of stored products.
    pub product_count: usize,
    /// Number of stored clients.
    pub client_count: usize,
    /// Number of stored sales.
    pub sale_count: usize,
    /// Whether every product id is distinct.
    pub ids_unique: bool,
    /// Records sharing an id with an earlier record, per collection.
    pub duplicates: BTreeMap<CollectionKind, usize>,
}

impl IntegrityReport {
    pub(crate) fn inspect(products: &[Record], clients: &[Record], sales: &[Record]) -> Self {
        let duplicates: BTreeMap<CollectionKind, usize> = [
            (CollectionKind::Products, count_duplicates(products)),
            (CollectionKind::Clients, count_duplicates(clients)),
            (CollectionKind::Sales, count_duplicates(sales)),
        ]
        .into_iter()
        .collect();

        Self {
            product_count: products.len(),
            client_count: clients.len(),
            sale_count: sales.len(),
            ids_unique: duplicates[&CollectionKind::Products] == 0,
            duplicates,
        }
    }

    /// Returns the total number of duplicate records across collections.
    #[must_use]
    pub fn total_duplicates(&self) -> usize {
        self.duplicates.values().sum()
    }

    /// Returns true if no collection holds duplicates.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.total_duplicates() == 0
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Products:   {}", self.product_count)?;
        writeln!(f, "Clients:    {}", self.client_count)?;
        writeln!(f, "Sales:      {}", self.sale_count)?;
        write!(f, "IDs unique: {}", self.ids_unique)?;
        for (kind, count) in self.duplicates.iter().filter(|(_, c)| **c > 0) {
            write!(f, "\nDuplicate {kind}: {count}")?;
        }
        Ok(())
    }
}

/// Records removed by a duplicate cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Records dropped, per rewritten collection.
    pub removed: BTreeMap<CollectionKind, usize>,
}

impl CleanupReport {
    /// Returns the total number of records removed.
    #[must_use]
    pub fn total_removed(&self) -> usize {
        self.removed.values().sum()
    }
}

/// Size of one managed key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyUsage {
    /// The unprefixed key name.
    pub key: String,
    /// Stored size in bytes, `None` if the key is absent.
    pub bytes: Option<u64>,
}

impl KeyUsage {
    /// Returns the size in kilobytes.
    #[must_use]
    pub fn kilobytes(&self) -> f64 {
        self.bytes.map_or(0.0, to_kilobytes)
    }
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes {
            Some(bytes) => write!(f, "{:.2} KB", to_kilobytes(bytes)),
            None => f.write_str("0 KB"),
        }
    }
}

fn to_kilobytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

/// Storage consumed by the managed keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    /// Per-key sizes, in managed-key order.
    pub keys: Vec<KeyUsage>,
    /// Sum of all key sizes in bytes.
    pub total_bytes: u64,
}

impl StorageUsage {
    pub(crate) fn measure(adapter: &KvAdapter) -> Self {
        let keys: Vec<KeyUsage> = MANAGED_KEYS
            .iter()
            .map(|key| KeyUsage {
                key: (*key).to_string(),
                bytes: adapter.value_len(key),
            })
            .collect();
        let total_bytes = keys.iter().filter_map(|k| k.bytes).sum();

        Self { keys, total_bytes }
    }

    /// Returns the usage entry of one key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&KeyUsage> {
        self.keys.iter().find(|k| k.key == key)
    }

    /// Returns the total size in kilobytes.
    #[must_use]
    pub fn total_kilobytes(&self) -> f64 {
        to_kilobytes(self.total_bytes)
    }
}

impl fmt::Display for StorageUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} KB", self.total_kilobytes())?;
        for usage in &self.keys {
            write!(f, "\n  {:<12}{usage}", usage.key)?;
        }
        Ok(())
    }
}

/// Read-only summary of a store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStatus {
    /// Data format version.
    pub version: String,
    /// When a collection was last written, if ever.
    pub last_update: Option<String>,
    /// Integrity of the stored collections.
    pub integrity: IntegrityReport,
    /// Storage consumed per key.
    pub storage_usage: StorageUsage,
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Version:     {}", self.version)?;
        writeln!(
            f,
            "Last update: {}",
            self.last_update.as_deref().unwrap_or("never")
        )?;
        writeln!(f, "{}", self.integrity)?;
        write!(f, "Storage:     {}", self.storage_usage)
    }
}
