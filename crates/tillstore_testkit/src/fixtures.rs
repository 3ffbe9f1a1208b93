//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common shop scenarios.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tillstore_core::{Config, DataManager};
use tillstore_storage::{InMemoryBackend, KeyValueBackend};

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: DataManager,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: DataManager::open_in_memory().expect("Failed to open in-memory store"),
            temp_dir: None,
        }
    }

    /// Creates an in-memory test store over pre-seeded raw entries.
    ///
    /// Useful for reading legacy, duplicated or corrupt data.
    pub fn seeded<I, K, V>(entries: I, config: Config) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let backend: Arc<dyn KeyValueBackend> = Arc::new(InMemoryBackend::with_entries(entries));
        Self {
            store: DataManager::open_with_backend(backend, config)
                .expect("Failed to open seeded store"),
            temp_dir: None,
        }
    }

    /// Creates a new file-based test store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = DataManager::open(temp_dir.path()).expect("Failed to open file store");

        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Closes and reopens a file-based store, keeping its directory.
    ///
    /// # Panics
    ///
    /// Panics if the store is in-memory.
    #[must_use]
    pub fn reopen(self) -> Self {
        let temp_dir = self.temp_dir.expect("Only file stores can be reopened");
        drop(self.store);

        let store = DataManager::open(temp_dir.path()).expect("Failed to reopen file store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }
}

impl std::ops::Deref for TestStore {
    type Target = DataManager;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary in-memory store.
///
/// # Example
///
/// ```rust
/// use tillstore_testkit::with_temp_store;
///
/// with_temp_store(|store| {
///     assert!(store.get_sales().is_empty());
/// });
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&DataManager) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.store)
}

/// Runs a test with a temporary file-based store.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&DataManager, &Path) -> R,
{
    let test_store = TestStore::file();
    let path = test_store
        .path()
        .expect("File store should have a path")
        .to_path_buf();
    f(&test_store.store, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use serde_json::json;

    /// Creates a store holding products with the given `(id, stock)` pairs.
    pub fn stocked_store(products: &[(i64, i64)]) -> TestStore {
        let test_store = TestStore::memory();

        for (id, stock) in products {
            test_store
                .add_product(json!({"id": id, "name": format!("product-{id}"), "stock": stock}))
                .expect("Failed to add product");
        }

        test_store
    }

    /// Creates a store whose raw data holds duplicate ids in every
    /// collection, opened without start-up cleanup.
    pub fn duplicated_store() -> TestStore {
        TestStore::seeded(
            [
                (
                    "products",
                    r#"[{"id":1,"name":"first","stock":4},{"id":1,"name":"second"},{"id":2}]"#,
                ),
                ("clients", r#"[{"id":7},{"id":7},{"id":7}]"#),
                ("sales", r#"[{"id":9,"total":1},{"id":9,"total":2}]"#),
            ],
            Config::default().clean_on_open(false),
        )
    }
}
