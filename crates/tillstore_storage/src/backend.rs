//! Storage backend trait definition.

use crate::error::{StorageError, StorageResult};

/// A low-level key-value backend for TillStore.
///
/// Backends are **opaque text stores**. They map keys to whole string
/// values; the core serializes documents before handing them over and
/// owns all interpretation of the stored text.
///
/// # Invariants
///
/// - `get` returns exactly the text last written with `put` for that key
/// - A failed `put` leaves the previous value for the key untouched
/// - `remove` of an absent key is not an error
/// - Backends must be `Send + Sync`; writes use interior locking
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait KeyValueBackend: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the value cannot be read.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid, the quota would be exceeded,
    /// or an I/O error occurs.
    fn put(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key`. Returns whether a value was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Returns all stored keys in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the key listing cannot be produced.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Returns the byte length of the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be inspected.
    fn value_len(&self, key: &str) -> StorageResult<Option<u64>> {
        Ok(self.get(key)?.map(|value| value.len() as u64))
    }

    /// Flushes pending writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&self) -> StorageResult<()>;
}

/// Checks that `key` is usable by every backend.
///
/// Keys must be non-empty, must not start with a dot, and may only contain
/// ASCII letters, digits, `_`, `-` and `.`. The file backend maps keys
/// directly onto file names, so the same rule applies everywhere.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] when the key is rejected.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::invalid_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_keys() {
        assert!(validate_key("products").is_ok());
        assert!(validate_key("shop_a.nextId").is_ok());
        assert!(validate_key("sales-v2").is_ok());
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("with space").is_err());
        assert!(validate_key("slash/inside").is_err());
    }
}
