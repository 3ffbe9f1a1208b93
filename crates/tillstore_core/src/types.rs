//! Core type definitions for TillStore.

use chrono::{SecondsFormat, Utc};
use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Serializes read-modify-write cycles within one process.
///
/// Reentrant so that a write may run nested writes (a sale adjusting stock)
/// and change listeners may call back into the manager.
pub(crate) type WriteLock = Arc<ReentrantMutex<()>>;

/// Storage key of the product collection.
pub const PRODUCTS_KEY: &str = "products";
/// Storage key of the client collection.
pub const CLIENTS_KEY: &str = "clients";
/// Storage key of the sale collection.
pub const SALES_KEY: &str = "sales";
/// Storage key of the identifier counter.
pub const NEXT_ID_KEY: &str = "nextId";
/// Storage key of the last modification timestamp.
pub const LAST_UPDATE_KEY: &str = "lastUpdate";

/// Every key the data manager owns, in reporting order.
pub const MANAGED_KEYS: [&str; 5] = [
    PRODUCTS_KEY,
    CLIENTS_KEY,
    SALES_KEY,
    NEXT_ID_KEY,
    LAST_UPDATE_KEY,
];

/// Integer identifier of a record.
///
/// Identifiers handed out by the allocator are monotonically increasing
/// and never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Creates a record ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Sequence number of a change event.
///
/// Sequence numbers give the order of writes across all collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    /// Creates a new sequence number.
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the raw sequence value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq:{}", self.0)
    }
}

/// The three record collections managed by TillStore.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Inventory items.
    Products,
    /// Customer profiles.
    Clients,
    /// Recorded sales.
    Sales,
}

impl CollectionKind {
    /// All collections, in reporting order.
    pub const ALL: [CollectionKind; 3] = [Self::Products, Self::Clients, Self::Sales];

    /// Returns the collection name used in events and exports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Clients => "clients",
            Self::Sales => "sales",
        }
    }

    /// Returns the (unprefixed) storage key of the collection.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Products => PRODUCTS_KEY,
            Self::Clients => CLIENTS_KEY,
            Self::Sales => SALES_KEY,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CollectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "products" | "product" => Ok(Self::Products),
            "clients" | "client" => Ok(Self::Clients),
            "sales" | "sale" => Ok(Self::Sales),
            other => Err(format!(
                "unknown collection {other:?} (expected products, clients or sales)"
            )),
        }
    }
}

/// Returns the current UTC time as an ISO-8601 string with milliseconds,
/// e.g. `2024-05-01T09:30:00.000Z`.
#[must_use]
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_kind_parses_names() {
        assert_eq!("products".parse(), Ok(CollectionKind::Products));
        assert_eq!("Client".parse(), Ok(CollectionKind::Clients));
        assert_eq!("SALES".parse(), Ok(CollectionKind::Sales));
        assert!("orders".parse::<CollectionKind>().is_err());
    }

    #[test]
    fn collection_kind_serializes_lowercase() {
        let json = serde_json::to_string(&CollectionKind::Products).unwrap();
        assert_eq!(json, "\"products\"");
    }

    #[test]
    fn record_id_is_transparent() {
        let id: RecordId = serde_json::from_str("1007").unwrap();
        assert_eq!(id, RecordId::new(1007));
        assert_eq!(serde_json::to_string(&id).unwrap(), "1007");
    }

    #[test]
    fn iso_now_has_millis_and_zulu() {
        let now = iso_now();
        assert!(now.ends_with('Z'));
        assert_eq!(now.len(), "2024-05-01T09:30:00.000Z".len());
    }
}
