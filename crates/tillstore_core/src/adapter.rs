//! JSON persistence on top of a key-value backend.
//!
//! The adapter is the only place that talks to the backend. It isolates
//! storage failures from collection logic:
//!
//! - reads never fail: a missing key, unreadable value or undecodable text
//!   yields the caller's default (the last two with a warning)
//! - writes report failure as [`CoreError`] and leave the previous value
//!   in place

use crate::error::CoreResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tillstore_storage::KeyValueBackend;
use tracing::{debug, warn};

/// Serializing front end of a [`KeyValueBackend`].
pub struct KvAdapter {
    backend: Arc<dyn KeyValueBackend>,
    prefix: String,
}

impl KvAdapter {
    /// Creates an adapter that prefixes every key with `prefix`.
    pub fn new(backend: Arc<dyn KeyValueBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    /// Returns the backend key for a logical key.
    #[must_use]
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Returns the underlying backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn KeyValueBackend> {
        &self.backend
    }

    /// Loads and decodes the value under `key`, or returns `default`.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.try_load(key).unwrap_or(default)
    }

    /// Loads and decodes the value under `key`.
    ///
    /// Returns `None` when the key is absent or its value is unusable.
    pub fn try_load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let text = self.raw(key)?;
        if text.is_empty() {
            return None;
        }

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %self.storage_key(key), error = %e, "stored value is not valid JSON, using default");
                None
            }
        }
    }

    /// Returns the raw stored text under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        let storage_key = self.storage_key(key);
        match self.backend.get(&storage_key) {
            Ok(value) => {
                if value.is_none() {
                    debug!(key = %storage_key, "key not present");
                }
                value
            }
            Err(e) => {
                warn!(key = %storage_key, error = %e, "failed to read from storage");
                None
            }
        }
    }

    /// Encodes `value` and stores it under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails. The stored
    /// value is unchanged in that case.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CoreResult<()> {
        let storage_key = self.storage_key(key);
        let text = serde_json::to_string(value)?;

        self.backend.put(&storage_key, &text).map_err(|e| {
            warn!(key = %storage_key, error = %e, "failed to write to storage");
            e
        })?;

        debug!(key = %storage_key, bytes = text.len(), "saved");
        Ok(())
    }

    /// Removes `key`. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend removal fails.
    pub fn remove(&self, key: &str) -> CoreResult<bool> {
        Ok(self.backend.remove(&self.storage_key(key))?)
    }

    /// Returns the stored byte length of `key`, treating failures as absent.
    pub fn value_len(&self, key: &str) -> Option<u64> {
        let storage_key = self.storage_key(key);
        self.backend
            .value_len(&storage_key)
            .map_err(|e| warn!(key = %storage_key, error = %e, "failed to inspect storage"))
            .ok()
            .flatten()
    }
}

impl std::fmt::Debug for KvAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvAdapter")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
