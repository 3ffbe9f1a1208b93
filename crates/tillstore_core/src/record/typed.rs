//! Typed views over records.
//!
//! These structs are conveniences for callers that build or read records
//! in Rust. Fields the core doesn't know about are kept in `extra` so a
//! decode followed by an encode loses nothing.

use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An inventory item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Product {
    /// Identifier; assigned on insert when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Units on hand.
    #[serde(default)]
    pub stock: i64,
    /// Descriptive fields (price, category, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Creates a product without an identifier.
    #[must_use]
    pub fn new(name: impl Into<String>, stock: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            stock,
            extra: Map::new(),
        }
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<RecordId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a descriptive field.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(field.into(), value.into());
        self
    }
}

/// A customer profile. Everything except `id` is free-form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Client {
    /// Identifier; assigned on insert when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Profile fields.
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl Client {
    /// Creates an empty client profile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a profile field.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.profile.insert(field.into(), value.into());
        self
    }
}

/// One sold line of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    /// The product sold.
    pub product_id: RecordId,
    /// Units sold.
    pub quantity: i64,
    /// Other line fields (unit price, name snapshot, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SaleItem {
    /// Creates a line item.
    #[must_use]
    pub fn new(product_id: impl Into<RecordId>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            extra: Map::new(),
        }
    }
}

/// A recorded sale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sale {
    /// Identifier; assigned on insert when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// ISO-8601 time of sale; assigned on insert when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Amount charged.
    #[serde(default)]
    pub total: f64,
    /// Sold lines, applied to stock in order.
    #[serde(default)]
    pub items: Vec<SaleItem>,
    /// Other sale fields (client, payment method, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Sale {
    /// Creates a sale with the given total and no lines.
    #[must_use]
    pub fn new(total: f64) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Appends a line item.
    #[must_use]
    pub fn with_item(mut self, product_id: impl Into<RecordId>, quantity: i64) -> Self {
        self.items.push(SaleItem::new(product_id, quantity));
        self
    }
}
