//! Sale recording and stock adjustment.

use crate::allocator::IdAllocator;
use crate::collection::Collection;
use crate::config::QuantityPolicy;
use crate::error::{CoreError, CoreResult};
use crate::record::{whole_number, IdKey, Record};
use crate::types::{iso_now, WriteLock};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A sale line item the engine can act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    /// The product sold.
    pub product: IdKey,
    /// Units sold.
    pub quantity: i64,
}

impl LineItem {
    fn from_value(value: &Value) -> Option<Self> {
        let item = value.as_object()?;
        let product = IdKey::from_value(item.get("productId"));
        if product == IdKey::Missing {
            return None;
        }
        let quantity = whole_number(item.get("quantity")?)?;
        Some(Self { product, quantity })
    }
}

/// Extracts the actionable line items of a sale, in order.
///
/// Items without a `productId` or with a non-integer `quantity` are skipped.
#[must_use]
pub fn line_items(sale: &Record) -> Vec<LineItem> {
    let Some(Value::Array(items)) = sale.get("items") else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let item = LineItem::from_value(value);
            if item.is_none() {
                debug!(index, "skipping unusable line item");
            }
            item
        })
        .collect()
}

/// Computes the stock left after selling `quantity` units, floored at zero.
///
/// A missing or null stock counts as zero. Fractional numbers and numeric
/// strings are accepted; the result is written back as an integer when it
/// is whole. Returns `None` for a stock that is not numeric at all.
fn remaining_stock(stock: Option<&Value>, quantity: i64) -> Option<Value> {
    let level = match stock {
        None | Some(Value::Null) => return Some(Value::from(0i64.saturating_sub(quantity).max(0))),
        Some(value) => {
            if let Some(whole) = whole_number(value) {
                return Some(Value::from(whole.saturating_sub(quantity).max(0)));
            }
            match value {
                Value::Number(n) => n.as_f64()?,
                Value::String(text) => text.trim().parse::<f64>().ok()?,
                _ => return None,
            }
        }
    };
    if !level.is_finite() {
        return None;
    }

    let remaining = Value::from((level - quantity as f64).max(0.0));
    Some(whole_number(&remaining).map_or(remaining, Value::from))
}

/// Applies line items to `products`, flooring stock at zero.
///
/// Items referencing unknown products are ignored. A product whose `stock`
/// is not numeric is left untouched. Returns whether any product was
/// changed.
pub fn apply_line_items(products: &mut [Record], items: &[LineItem]) -> bool {
    let mut touched = false;

    for item in items {
        let Some(product) = products.iter_mut().find(|p| p.id_key() == item.product) else {
            debug!(product = %item.product, "sale references unknown product");
            continue;
        };

        let Some(remaining) = remaining_stock(product.get("stock"), item.quantity) else {
            warn!(product = %item.product, "stock is not numeric, leaving product unchanged");
            continue;
        };

        debug!(product = %item.product, to = %remaining, "stock adjusted");
        product.insert("stock", remaining);
        touched = true;
    }

    touched
}

/// Records sales and keeps product stock in step.
#[derive(Debug)]
pub(crate) struct Inventory {
    sales: Arc<Collection>,
    products: Arc<Collection>,
    allocator: Arc<IdAllocator>,
    policy: QuantityPolicy,
    lock: WriteLock,
}

impl Inventory {
    pub(crate) fn new(
        sales: Arc<Collection>,
        products: Arc<Collection>,
        allocator: Arc<IdAllocator>,
        policy: QuantityPolicy,
        lock: WriteLock,
    ) -> Self {
        Self {
            sales,
            products,
            allocator,
            policy,
            lock,
        }
    }

    /// Persists a sale and decrements stock for each line item.
    ///
    /// The sale is written first; product stock follows in a single
    /// write, skipped when no line item matched a product.
    pub(crate) fn record_sale(&self, mut sale: Record) -> CoreResult<Vec<Record>> {
        let _guard = self.lock.lock();

        let items = line_items(&sale);
        if self.policy == QuantityPolicy::RejectNonPositive {
            if let Some(item) = items.iter().find(|item| item.quantity <= 0) {
                return Err(CoreError::InvalidQuantity {
                    product: item.product.clone(),
                    quantity: item.quantity,
                });
            }
        }

        if !sale.has_id() {
            sale.set_id(self.allocator.next_id()?);
        }
        if matches!(sale.get("timestamp"), None | Some(Value::Null)) {
            sale.insert("timestamp", iso_now());
        }

        let sale_id = sale.id_key();
        let saved = self.sales.add(sale)?;

        let mut products = self.products.get_all();
        if apply_line_items(&mut products, &items) {
            self.products.save_all(products)?;
        }

        info!(sale = %sale_id, items = items.len(), "sale recorded");
        Ok(saved)
    }
}
