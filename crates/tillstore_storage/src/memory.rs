//! In-memory storage backend for testing.

use crate::backend::{validate_key, KeyValueBackend};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory key-value backend.
///
/// This backend stores all values in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// An optional byte quota makes writes fail the way browser storage does
/// once it is full. Usage counts the bytes of every key and value.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use tillstore_storage::{KeyValueBackend, InMemoryBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.put("nextId", "1000").unwrap();
/// assert_eq!(backend.used_bytes(), 10);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    entries: RwLock<BTreeMap<String, String>>,
    quota: Option<u64>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty backend that rejects writes past `limit` bytes.
    #[must_use]
    pub fn with_quota(limit: u64) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota: Some(limit),
        }
    }

    /// Creates a backend with pre-existing entries.
    ///
    /// Useful for testing reads of legacy or corrupted data.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            quota: None,
        }
    }

    /// Returns the number of bytes used by keys and values.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        Self::usage(&self.entries.read())
    }

    /// Clears all entries from the backend.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    fn usage(entries: &BTreeMap<String, String>) -> u64 {
        entries
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum()
    }
}

impl KeyValueBackend for InMemoryBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        let mut entries = self.entries.write();

        if let Some(limit) = self.quota {
            let previous = entries
                .get(key)
                .map(|old| (key.len() + old.len()) as u64)
                .unwrap_or(0);
            let requested = Self::usage(&entries) - previous + (key.len() + value.len()) as u64;
            if requested > limit {
                return Err(StorageError::QuotaExceeded { requested, limit });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.entries.write().remove(key).is_some())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }

    fn flush(&self) -> StorageResult<()> {
        // In-memory backend has no pending writes
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let backend = InMemoryBackend::new();
        assert!(backend.keys().unwrap().is_empty());
        assert_eq!(backend.used_bytes(), 0);
    }

    #[test]
    fn memory_put_and_get() {
        let backend = InMemoryBackend::new();
        backend.put("products", "[1,2]").unwrap();
        assert_eq!(backend.get("products").unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(backend.get("clients").unwrap(), None);
    }

    #[test]
    fn memory_put_replaces() {
        let backend = InMemoryBackend::new();
        backend.put("nextId", "1000").unwrap();
        backend.put("nextId", "1001").unwrap();
        assert_eq!(backend.get("nextId").unwrap().as_deref(), Some("1001"));
        assert_eq!(backend.keys().unwrap(), vec!["nextId".to_string()]);
    }

    #[test]
    fn memory_remove() {
        let backend = InMemoryBackend::new();
        backend.put("sales", "[]").unwrap();
        assert!(backend.remove("sales").unwrap());
        assert!(!backend.remove("sales").unwrap());
        assert_eq!(backend.get("sales").unwrap(), None);
    }

    #[test]
    fn memory_keys_are_sorted() {
        let backend = InMemoryBackend::new();
        backend.put("sales", "[]").unwrap();
        backend.put("clients", "[]").unwrap();
        backend.put("products", "[]").unwrap();
        assert_eq!(backend.keys().unwrap(), vec!["clients", "products", "sales"]);
    }

    #[test]
    fn memory_value_len() {
        let backend = InMemoryBackend::new();
        backend.put("lastUpdate", "\"2024-01-01\"").unwrap();
        assert_eq!(backend.value_len("lastUpdate").unwrap(), Some(12));
        assert_eq!(backend.value_len("missing").unwrap(), None);
    }

    #[test]
    fn memory_quota_rejects_and_keeps_old_value() {
        let backend = InMemoryBackend::with_quota(20);
        backend.put("products", "[]").unwrap();

        let result = backend.put("products", "[1,2,3,4,5,6,7,8,9]");
        assert!(matches!(result, Err(StorageError::QuotaExceeded { limit: 20, .. })));
        assert_eq!(backend.get("products").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn memory_quota_counts_replacement_not_sum() {
        let backend = InMemoryBackend::with_quota(12);
        backend.put("k", "0123456789").unwrap();
        backend.put("k", "9876543210").unwrap();
        assert_eq!(backend.used_bytes(), 11);
    }

    #[test]
    fn memory_invalid_key_fails() {
        let backend = InMemoryBackend::new();
        assert!(matches!(
            backend.put("../x", "1"),
            Err(StorageError::InvalidKey { .. })
        ));
    }

    #[test]
    fn memory_with_entries_and_clear() {
        let backend = InMemoryBackend::with_entries([("products", "not json")]);
        assert_eq!(backend.get("products").unwrap().as_deref(), Some("not json"));
        backend.clear();
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn memory_flush_succeeds() {
        let backend = InMemoryBackend::new();
        backend.put("k", "v").unwrap();
        assert!(backend.flush().is_ok());
    }
}
