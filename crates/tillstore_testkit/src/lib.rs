//! # TillStore Testkit
//!
//! Test utilities for TillStore.
//!
//! This crate provides:
//! - Test fixtures and store helpers
//! - Property-based test generators using proptest
//! - A model-checking harness for stock and sale scenarios
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use tillstore_testkit::prelude::*;
//!
//! with_temp_store(|store| {
//!     store.add_product(serde_json::json!({"name": "Shirt", "stock": 3})).unwrap();
//!     assert_eq!(store.get_products().len(), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
