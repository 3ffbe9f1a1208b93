//! # TillStore Storage
//!
//! Key-value storage backends for TillStore.
//!
//! This crate provides the lowest-level storage abstraction for TillStore.
//! Backends are **opaque text stores** - they map keys to strings and do
//! not interpret the JSON documents written through them.
//!
//! ## Design Principles
//!
//! - Backends are simple key-value stores (get, put, remove, list)
//! - No knowledge of records, collections, or identifiers
//! - Must be `Send + Sync` for shared access
//! - TillStore core owns all document format interpretation
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage, with optional quota
//! - [`FileBackend`] - One file per key inside a locked directory
//!
//! ## Example
//!
//! ```rust
//! use tillstore_storage::{KeyValueBackend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::new();
//! backend.put("products", "[]").unwrap();
//! assert_eq!(backend.get("products").unwrap().as_deref(), Some("[]"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::{validate_key, KeyValueBackend};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
