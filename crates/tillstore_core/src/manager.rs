//! Data manager facade.

use crate::adapter::KvAdapter;
use crate::allocator::IdAllocator;
use crate::change_feed::{ChangeEvent, ChangeFeed, Subscription, SubscriptionId};
use crate::collection::{count_duplicates, Collection};
use crate::config::Config;
use crate::diagnostics::{CleanupReport, IntegrityReport, StorageUsage, SystemStatus};
use crate::error::{CoreError, CoreResult};
use crate::inventory::Inventory;
use crate::record::{IdKey, IntoRecord, Record};
use crate::transfer::{parse_import, ExportPayload, ImportSummary};
use crate::types::{CollectionKind, RecordId, WriteLock, LAST_UPDATE_KEY, MANAGED_KEYS};
use crate::FORMAT_VERSION;
use parking_lot::ReentrantMutex;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tillstore_storage::{FileBackend, InMemoryBackend, KeyValueBackend};
use tracing::{info, warn};

/// The main store handle.
///
/// `DataManager` is the single entry point for shop data. It owns:
/// - The storage adapter and identifier allocator
/// - One [`Collection`] per record kind
/// - The sale engine that keeps stock in step with sales
/// - The change feed
///
/// Every read-modify-write cycle runs under one reentrant write lock, so
/// concurrent callers in the same process serialize instead of losing
/// updates. The handle is `Send + Sync`; share it behind an `Arc`.
///
/// # Opening a Store
///
/// ```rust,no_run
/// use tillstore_core::DataManager;
/// use std::path::Path;
///
/// let store = DataManager::open(Path::new("shop-data")).unwrap();
/// println!("{} products", store.get_products().len());
/// ```
///
/// # In-Memory Stores
///
/// ```rust
/// use tillstore_core::{DataManager, Product};
///
/// let store = DataManager::open_in_memory().unwrap();
/// let products = store.add_product(Product::new("Shirt", 10)).unwrap();
/// assert_eq!(products.len(), 1);
/// ```
#[derive(Debug)]
pub struct DataManager {
    config: Config,
    adapter: Arc<KvAdapter>,
    allocator: Arc<IdAllocator>,
    feed: Arc<ChangeFeed>,
    products: Arc<Collection>,
    clients: Arc<Collection>,
    sales: Arc<Collection>,
    inventory: Inventory,
    lock: WriteLock,
}

impl DataManager {
    /// Opens a file-backed store in `path` with default configuration.
    ///
    /// The directory is created if missing and locked for exclusive use.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or another
    /// process holds the lock.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a file-backed store with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use tillstore_core::{Config, DataManager, QuantityPolicy};
    /// use std::path::Path;
    ///
    /// let config = Config::default()
    ///     .key_prefix("shop1.")
    ///     .quantity_policy(QuantityPolicy::RejectNonPositive);
    ///
    /// let store = DataManager::open_with_config(Path::new("shop-data"), config).unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    pub fn open_with_config(path: &Path, config: Config) -> CoreResult<Self> {
        let backend = FileBackend::open(path)?;
        info!(path = %path.display(), "opened file store");
        Self::open_with_backend(Arc::new(backend), config)
    }

    /// Opens a store over an existing backend.
    ///
    /// # Errors
    ///
    /// Start-up maintenance failures are logged, not returned; the result
    /// is currently always `Ok`.
    pub fn open_with_backend(
        backend: Arc<dyn KeyValueBackend>,
        config: Config,
    ) -> CoreResult<Self> {
        let lock: WriteLock = Arc::new(ReentrantMutex::new(()));
        let adapter = Arc::new(KvAdapter::new(backend, config.key_prefix.clone()));
        let allocator = Arc::new(IdAllocator::new(
            Arc::clone(&adapter),
            config.id_floor,
            Arc::clone(&lock),
        ));
        let feed = Arc::new(ChangeFeed::new());

        let collection = |kind| {
            Arc::new(Collection::new(
                kind,
                Arc::clone(&adapter),
                Arc::clone(&allocator),
                Arc::clone(&feed),
                Arc::clone(&lock),
            ))
        };
        let products = collection(CollectionKind::Products);
        let clients = collection(CollectionKind::Clients);
        let sales = collection(CollectionKind::Sales);

        let inventory = Inventory::new(
            Arc::clone(&sales),
            Arc::clone(&products),
            Arc::clone(&allocator),
            config.quantity_policy,
            Arc::clone(&lock),
        );

        let manager = Self {
            config,
            adapter,
            allocator,
            feed,
            products,
            clients,
            sales,
            inventory,
            lock,
        };

        if manager.config.clean_on_open {
            manager.startup_maintenance();
        }

        Ok(manager)
    }

    /// Opens a fresh in-memory store.
    ///
    /// Data is lost when the manager is dropped.
    ///
    /// # Errors
    ///
    /// See [`open_with_backend`](Self::open_with_backend).
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_with_backend(Arc::new(InMemoryBackend::new()), Config::default())
    }

    fn startup_maintenance(&self) {
        match self.clean_duplicates() {
            Ok(report) if report.total_removed() > 0 => {
                info!(removed = report.total_removed(), "removed duplicates on open");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "duplicate cleanup on open failed"),
        }

        let report = self.verify_integrity();
        info!(
            products = report.product_count,
            clients = report.client_count,
            sales = report.sale_count,
            "store ready"
        );
    }

    /// Returns the configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the collection of the given kind.
    #[must_use]
    pub fn collection(&self, kind: CollectionKind) -> &Collection {
        match kind {
            CollectionKind::Products => &self.products,
            CollectionKind::Clients => &self.clients,
            CollectionKind::Sales => &self.sales,
        }
    }

    /// Allocates a fresh record identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter cannot be persisted.
    pub fn next_id(&self) -> CoreResult<RecordId> {
        self.allocator.next_id()
    }

    /// Flushes buffered writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend flush fails.
    pub fn flush(&self) -> CoreResult<()> {
        Ok(self.adapter.backend().flush()?)
    }

    // ========================================================================
    // Products
    // ========================================================================

    /// Returns all products.
    pub fn get_products(&self) -> Vec<Record> {
        self.products.get_all()
    }

    /// Replaces all products. See [`Collection::save_all`].
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_products(&self, products: Vec<Record>) -> CoreResult<Vec<Record>> {
        self.products.save_all(products)
    }

    /// Adds a product or merges it into the product with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if `product` is not an object or the write fails.
    pub fn add_product(&self, product: impl IntoRecord) -> CoreResult<Vec<Record>> {
        self.products.add(product.into_record()?)
    }

    /// Deletes a product. Unknown ids are a logged no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn delete_product(&self, id: impl Into<IdKey>) -> CoreResult<Vec<Record>> {
        self.products.remove(id)
    }

    /// Sets the stock of a product. Unknown ids are a logged no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn update_stock(&self, id: impl Into<IdKey>, new_stock: i64) -> CoreResult<Vec<Record>> {
        let id = id.into();
        info!(product = %id, stock = new_stock, "setting stock");
        self.products.update(id, |product| {
            product.insert("stock", new_stock);
        })
    }

    // ========================================================================
    // Clients
    // ========================================================================

    /// Returns all clients.
    pub fn get_clients(&self) -> Vec<Record> {
        self.clients.get_all()
    }

    /// Replaces all clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_clients(&self, clients: Vec<Record>) -> CoreResult<Vec<Record>> {
        self.clients.save_all(clients)
    }

    /// Adds a client or merges it into the client with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if `client` is not an object or the write fails.
    pub fn add_client(&self, client: impl IntoRecord) -> CoreResult<Vec<Record>> {
        self.clients.add(client.into_record()?)
    }

    /// Deletes a client. Unknown ids are a logged no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn delete_client(&self, id: impl Into<IdKey>) -> CoreResult<Vec<Record>> {
        self.clients.remove(id)
    }

    // ========================================================================
    // Sales
    // ========================================================================

    /// Returns all sales.
    pub fn get_sales(&self) -> Vec<Record> {
        self.sales.get_all()
    }

    /// Replaces all sales. Stock is not touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_sales(&self, sales: Vec<Record>) -> CoreResult<Vec<Record>> {
        self.sales.save_all(sales)
    }

    /// Records a sale and decrements the stock of every product sold.
    ///
    /// The sale gets an id and a timestamp when it lacks them. Stock never
    /// drops below zero, and line items naming unknown products are
    /// skipped.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tillstore_core::{DataManager, Product, Sale};
    ///
    /// let store = DataManager::open_in_memory().unwrap();
    /// store.add_product(Product::new("Shirt", 10).with_id(5)).unwrap();
    ///
    /// store.add_sale(Sale::new(50.0).with_item(5, 2)).unwrap();
    ///
    /// let shirt = store.collection(tillstore_core::CollectionKind::Products).find(5).unwrap();
    /// assert_eq!(shirt.get_i64("stock"), Some(8));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuantity`] when the quantity policy
    /// rejects a line item (nothing is written), or a storage error if a
    /// write fails. When the sale is persisted but the stock write fails,
    /// the sale stays recorded.
    pub fn add_sale(&self, sale: impl IntoRecord) -> CoreResult<Vec<Record>> {
        self.inventory.record_sale(sale.into_record()?)
    }

    // ========================================================================
    // Change Subscription
    // ========================================================================

    /// Subscribes a channel to collection changes.
    pub fn subscribe(&self) -> Subscription {
        self.feed.subscribe()
    }

    /// Registers a callback for collection changes.
    pub fn on_change<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.feed.on_change(listener)
    }

    /// Removes a subscription or callback. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.feed.unsubscribe(id)
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Checks the stored collections for duplicate ids.
    ///
    /// Nothing is repaired; see [`clean_duplicates`](Self::clean_duplicates).
    pub fn verify_integrity(&self) -> IntegrityReport {
        let report = IntegrityReport::inspect(
            &self.products.get_all(),
            &self.clients.get_all(),
            &self.sales.get_all(),
        );
        if !report.is_clean() {
            warn!(duplicates = report.total_duplicates(), "duplicate ids detected");
        }
        report
    }

    /// Rewrites every collection that holds duplicate ids.
    ///
    /// Collections without duplicates are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if a rewrite fails. Collections rewritten before
    /// the failure stay cleaned.
    pub fn clean_duplicates(&self) -> CoreResult<CleanupReport> {
        let _guard = self.lock.lock();
        let mut report = CleanupReport::default();

        for kind in CollectionKind::ALL {
            let collection = self.collection(kind);
            let records = collection.get_all();
            let duplicates = count_duplicates(&records);
            if duplicates > 0 {
                collection.save_all(records)?;
                report.removed.insert(kind, duplicates);
            }
        }

        info!(removed = report.total_removed(), "duplicate cleanup finished");
        Ok(report)
    }

    /// Returns the per-key storage footprint.
    pub fn storage_usage(&self) -> StorageUsage {
        StorageUsage::measure(&self.adapter)
    }

    /// Returns a read-only summary of the store.
    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            version: FORMAT_VERSION.to_string(),
            last_update: self.adapter.try_load(LAST_UPDATE_KEY),
            integrity: self.verify_integrity(),
            storage_usage: self.storage_usage(),
        }
    }

    /// Erases all collections and metadata once `confirm` agrees.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ResetDeclined`] if `confirm` returns false, or
    /// a storage error if a key cannot be removed.
    pub fn reset_all<F>(&self, confirm: F) -> CoreResult<()>
    where
        F: FnOnce() -> bool,
    {
        if !confirm() {
            info!("reset declined");
            return Err(CoreError::ResetDeclined);
        }

        let _guard = self.lock.lock();
        for key in MANAGED_KEYS {
            self.adapter.remove(key)?;
        }

        warn!("all data erased");
        Ok(())
    }

    // ========================================================================
    // Export and Import
    // ========================================================================

    /// Takes a snapshot of all collections.
    pub fn export_all(&self) -> ExportPayload {
        let _guard = self.lock.lock();
        ExportPayload::new(
            self.products.get_all(),
            self.clients.get_all(),
            self.sales.get_all(),
        )
    }

    /// Replaces the collections present in `payload`.
    ///
    /// The payload must be a JSON object; each of `products`, `clients`
    /// and `sales` that is present and non-null must be an array of
    /// objects. All collections are validated before any is written.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPayload`] for a malformed payload, in
    /// which case nothing is written, or a storage error if a write fails.
    pub fn import_all(&self, payload: &Value) -> CoreResult<ImportSummary> {
        let collections = parse_import(payload)?;

        let _guard = self.lock.lock();
        let mut summary = ImportSummary::default();
        for (kind, records) in collections {
            let saved = self.collection(kind).save_all(records)?;
            summary.imported.insert(kind, saved.len());
        }

        info!(records = summary.total(), "import finished");
        Ok(summary)
    }
}
