//! Property-based test generators using proptest.
//!
//! Identifiers are drawn from a narrow range so generated collections
//! routinely contain duplicates.

use proptest::prelude::*;
use serde_json::{json, Value};
use tillstore_core::Record;

/// Strategy for identifiers drawn from a small pool.
pub fn record_id_strategy() -> impl Strategy<Value = i64> {
    0i64..12
}

/// Strategy for stock levels, including a few negative legacy values.
pub fn stock_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![
        8 => 0i64..200,
        1 => -5i64..0,
    ]
}

/// Strategy for an optional identifier value: integer, missing or legacy string.
fn id_value_strategy() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        8 => record_id_strategy().prop_map(|id| Some(json!(id))),
        1 => Just(None),
        1 => "[a-c]{1,2}".prop_map(|s| Some(json!(s))),
    ]
}

/// Strategy for a product record with opaque extra fields.
pub fn product_strategy() -> impl Strategy<Value = Record> {
    (
        id_value_strategy(),
        "[a-z]{1,8}",
        stock_strategy(),
        prop::option::of(0.0f64..500.0),
    )
        .prop_map(|(id, name, stock, price)| {
            let mut record = Record::new();
            if let Some(id) = id {
                record.insert("id", id);
            }
            record.insert("name", name);
            record.insert("stock", stock);
            if let Some(price) = price {
                record.insert("price", price);
            }
            record
        })
}

/// Strategy for a product collection that likely holds duplicate ids.
pub fn products_strategy(max_len: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(product_strategy(), 0..max_len)
}

/// Strategy for a sale over products with the given ids.
///
/// Line items may reference unknown products and carry any quantity.
pub fn sale_strategy(product_ids: Vec<i64>) -> impl Strategy<Value = Value> {
    let known = if product_ids.is_empty() {
        vec![0]
    } else {
        product_ids
    };
    let item = (
        prop_oneof![
            4 => prop::sample::select(known),
            1 => 100i64..110,
        ],
        -3i64..20,
    )
        .prop_map(|(product, quantity)| json!({"productId": product, "quantity": quantity}));

    (prop::collection::vec(item, 0..6), 0.0f64..1000.0)
        .prop_map(|(items, total)| json!({"total": total, "items": items}))
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn products_are_objects_with_stock(product in product_strategy()) {
            prop_assert!(product.get_i64("stock").is_some());
            prop_assert!(product.get("name").is_some());
        }

        #[test]
        fn sales_carry_item_arrays(sale in sale_strategy(vec![1, 2, 3])) {
            let items = sale["items"].as_array().cloned().unwrap_or_default();
            for item in items {
                prop_assert!(item["productId"].is_i64());
                prop_assert!(item["quantity"].is_i64());
            }
        }
    }
}
