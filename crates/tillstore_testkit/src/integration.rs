//! Cross-crate integration test helpers.
//!
//! [`InventoryHarness`] drives a store while keeping an independent model
//! of product stock, so scenario tests can check the store against it
//! after every step.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use tillstore_core::{CollectionKind, DataManager, IdKey, Record};

/// A test harness tracking expected stock levels.
pub struct InventoryHarness {
    /// The store instance.
    pub store: DataManager,
    stock: BTreeMap<i64, i64>,
}

impl InventoryHarness {
    /// Creates a new harness with an in-memory store.
    pub fn new() -> Self {
        Self::with_store(DataManager::open_in_memory().expect("Failed to open store"))
    }

    /// Creates a harness over an existing, empty store.
    pub fn with_store(store: DataManager) -> Self {
        Self {
            store,
            stock: BTreeMap::new(),
        }
    }

    /// Adds or restocks a product and tracks it.
    pub fn stock_product(&mut self, id: i64, stock: i64) {
        self.store
            .add_product(json!({"id": id, "name": format!("product-{id}"), "stock": stock}))
            .expect("Failed to add product");
        self.stock.insert(id, stock);
    }

    /// Sells `(product, quantity)` pairs and applies them to the model.
    pub fn sell(&mut self, items: &[(i64, i64)]) -> Record {
        let sale = json!({
            "total": items.len(),
            "items": items
                .iter()
                .map(|(product, quantity)| json!({"productId": product, "quantity": quantity}))
                .collect::<Vec<Value>>(),
        });
        self.sell_value(sale)
    }

    /// Records a raw sale document and applies its items to the model.
    pub fn sell_value(&mut self, sale: Value) -> Record {
        let record = Record::from_value(sale).expect("Sale must be an object");
        for item in tillstore_core::line_items(&record) {
            if let IdKey::Int(id) = item.product {
                if let Some(stock) = self.stock.get_mut(&id) {
                    *stock = stock.saturating_sub(item.quantity).max(0);
                }
            }
        }

        let sales = self.store.add_sale(record).expect("Failed to record sale");
        sales.last().cloned().expect("Sale must be persisted")
    }

    /// Returns the modeled stock of a product.
    pub fn expected_stock(&self, id: i64) -> Option<i64> {
        self.stock.get(&id).copied()
    }

    /// Verifies every tracked product's stock matches the model.
    pub fn verify_all(&self) {
        let products = self.store.collection(CollectionKind::Products);
        for (id, expected) in &self.stock {
            let actual = products
                .find(*id)
                .and_then(|p| p.get_i64("stock"))
                .expect("Tracked product missing");
            assert_eq!(actual, *expected, "Stock mismatch for product {id}");
        }
        assert_eq!(
            self.store.get_products().len(),
            self.stock.len(),
            "Product count mismatch"
        );
    }
}

impl Default for InventoryHarness {
    fn default() -> Self {
        Self::new()
    }
}
