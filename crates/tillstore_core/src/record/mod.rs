//! Records and record identity.
//!
//! A [`Record`] is a JSON object. Only `id` (and, for the sale engine,
//! `stock` and `items`) is interpreted by the core; every other field is
//! carried through untouched so that data written by older UI screens
//! round-trips without loss.

mod typed;

pub use typed::{Client, Product, Sale, SaleItem};

use crate::error::{CoreError, CoreResult};
use crate::types::RecordId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identity of a record for deduplication and lookup.
///
/// Identifiers written by this crate are always integers, but persisted
/// data may carry other JSON values. Two records are the same record when
/// their keys are equal; all records without an id share [`IdKey::Missing`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdKey {
    /// An integer identifier.
    Int(i64),
    /// Any other JSON value, in its serialized form.
    Other(String),
    /// No `id` field, or `id: null`.
    Missing,
}

impl IdKey {
    /// Derives the identity key of a raw `id` value.
    #[must_use]
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Missing,
            Some(v) => match whole_number(v) {
                Some(id) => Self::Int(id),
                None => Self::Other(v.to_string()),
            },
        }
    }
}

/// Reads a JSON number as an integer, accepting whole floats such as `1.0`.
pub(crate) fn whole_number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

impl From<RecordId> for IdKey {
    fn from(id: RecordId) -> Self {
        Self::Int(id.as_i64())
    }
}

impl From<i64> for IdKey {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl fmt::Display for IdKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Other(raw) => f.write_str(raw),
            Self::Missing => f.write_str("<none>"),
        }
    }
}

/// A single stored record: a JSON object with an `id` field.
///
/// # Example
///
/// ```rust
/// use tillstore_core::{Record, RecordId};
/// use serde_json::json;
///
/// let mut record = Record::from_value(json!({"name": "Shirt", "stock": 10})).unwrap();
/// assert!(!record.has_id());
/// record.set_id(RecordId::new(5));
/// assert_eq!(record.id(), Some(RecordId::new(5)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON value, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRecord`] for any non-object value.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CoreError::invalid_record(format!(
                "expected a JSON object, got {}",
                value_kind(&other)
            ))),
        }
    }

    /// Encodes a typed value (such as [`Product`]) as a record.
    ///
    /// # Errors
    ///
    /// Fails if the value does not serialize to a JSON object.
    pub fn from_typed<T: Serialize>(value: &T) -> CoreResult<Self> {
        Self::from_value(serde_json::to_value(value)?)
    }

    /// Decodes the record into a typed view.
    ///
    /// # Errors
    ///
    /// Fails if the record's fields don't match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> CoreResult<T> {
        Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
    }

    /// Returns the integer identifier, if the record has one.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        self.0.get("id").and_then(whole_number).map(RecordId::new)
    }

    /// Returns the identity key used for deduplication.
    #[must_use]
    pub fn id_key(&self) -> IdKey {
        IdKey::from_value(self.0.get("id"))
    }

    /// Returns whether the record carries a non-null `id`.
    #[must_use]
    pub fn has_id(&self) -> bool {
        self.id_key() != IdKey::Missing
    }

    /// Sets the record's identifier.
    pub fn set_id(&mut self, id: RecordId) {
        self.0.insert("id".to_string(), Value::from(id.as_i64()));
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Reads an integer field. Whole floating-point numbers are accepted.
    #[must_use]
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(whole_number)
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Shallow-merges `other` over this record.
    ///
    /// Fields present in `other` replace the current values; fields only
    /// present here are kept.
    pub fn merge_from(&mut self, other: Record) {
        for (field, value) in other.0 {
            self.0.insert(field, value);
        }
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Converts the record into a JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = CoreError;

    fn try_from(value: Value) -> CoreResult<Self> {
        Self::from_value(value)
    }
}

/// Conversion into a [`Record`] for the write operations.
///
/// Implemented for records, raw JSON values and the typed views, so
/// callers can pass whichever form they hold.
pub trait IntoRecord {
    /// Converts `self` into a record.
    ///
    /// # Errors
    ///
    /// Fails if the value is not a JSON object.
    fn into_record(self) -> CoreResult<Record>;
}

impl IntoRecord for Record {
    fn into_record(self) -> CoreResult<Record> {
        Ok(self)
    }
}

impl IntoRecord for Value {
    fn into_record(self) -> CoreResult<Record> {
        Record::from_value(self)
    }
}

impl IntoRecord for Product {
    fn into_record(self) -> CoreResult<Record> {
        Record::from_typed(&self)
    }
}

impl IntoRecord for Client {
    fn into_record(self) -> CoreResult<Record> {
        Record::from_typed(&self)
    }
}

impl IntoRecord for Sale {
    fn into_record(self) -> CoreResult<Record> {
        Record::from_typed(&self)
    }
}

/// Converts a JSON value into a list of records.
///
/// # Errors
///
/// Fails if `value` is not an array or any element is not an object.
pub fn records_from_value(value: Value) -> CoreResult<Vec<Record>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                Record::from_value(item).map_err(|e| {
                    CoreError::invalid_record(format!("element {index}: {e}"))
                })
            })
            .collect(),
        other => Err(CoreError::invalid_record(format!(
            "expected an array of records, got {}",
            value_kind(&other)
        ))),
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
