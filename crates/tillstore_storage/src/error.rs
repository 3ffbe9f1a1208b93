//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The key contains characters the backend cannot store.
    #[error("invalid storage key {key:?}")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },

    /// The write would exceed the backend's capacity.
    #[error("storage quota exceeded: {requested} bytes requested, limit {limit}")]
    QuotaExceeded {
        /// Total bytes the store would hold after the write.
        requested: u64,
        /// The configured limit in bytes.
        limit: u64,
    },

    /// Another process holds the store's lock.
    #[error("storage locked: another process has exclusive access")]
    Locked,

    /// A stored value could not be read back as text.
    #[error("storage corrupted: {0}")]
    Corrupted(String),
}

impl StorageError {
    /// Creates an invalid key error.
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey { key: key.into() }
    }
}
