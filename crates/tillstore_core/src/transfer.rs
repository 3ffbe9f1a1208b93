//! Export and import of complete store contents.
//!
//! An export is a single JSON document holding every collection plus the
//! data format version and the time of export. Imports accept the same
//! shape; any collection left out (or `null`) is kept as it is.
//!
//! ```json
//! {
//!   "version": "2.0.0",
//!   "timestamp": "2024-05-01T10:00:00.000Z",
//!   "products": [{"id": 1000, "name": "Shirt", "stock": 10}],
//!   "clients": [],
//!   "sales": []
//! }
//! ```

use crate::error::{CoreError, CoreResult};
use crate::record::{records_from_value, value_kind, Record};
use crate::types::{iso_now, CollectionKind};
use crate::FORMAT_VERSION;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A snapshot of all collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    /// Data format version of the exporting store.
    pub version: String,
    /// When the export was taken.
    pub timestamp: String,
    /// All products.
    #[serde(default)]
    pub products: Vec<Record>,
    /// All clients.
    #[serde(default)]
    pub clients: Vec<Record>,
    /// All sales.
    #[serde(default)]
    pub sales: Vec<Record>,
}

impl ExportPayload {
    pub(crate) fn new(products: Vec<Record>, clients: Vec<Record>, sales: Vec<Record>) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            timestamp: iso_now(),
            products,
            clients,
            sales,
        }
    }

    /// Returns the records of one collection.
    #[must_use]
    pub fn records(&self, kind: CollectionKind) -> &[Record] {
        match kind {
            CollectionKind::Products => &self.products,
            CollectionKind::Clients => &self.clients,
            CollectionKind::Sales => &self.sales,
        }
    }

    /// Converts the payload into a JSON value suitable for import.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be encoded.
    pub fn to_value(&self) -> CoreResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// What an import replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Records persisted, per replaced collection.
    pub imported: BTreeMap<CollectionKind, usize>,
}

impl ImportSummary {
    /// Returns the total number of records persisted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.imported.values().sum()
    }
}

/// Validates an import payload and extracts the collections it replaces.
///
/// Every present collection is checked before any is returned, so a
/// malformed payload never leads to a partial import.
pub(crate) fn parse_import(payload: &Value) -> CoreResult<Vec<(CollectionKind, Vec<Record>)>> {
    let Value::Object(fields) = payload else {
        return Err(CoreError::invalid_payload(format!(
            "expected a JSON object, got {}",
            value_kind(payload)
        )));
    };

    let mut collections = Vec::new();
    for kind in CollectionKind::ALL {
        match fields.get(kind.name()) {
            None | Some(Value::Null) => {}
            Some(value @ Value::Array(_)) => {
                let records = records_from_value(value.clone())
                    .map_err(|e| CoreError::invalid_payload(format!("{kind}: {e}")))?;
                collections.push((kind, records));
            }
            Some(other) => {
                return Err(CoreError::invalid_payload(format!(
                    "{kind}: expected an array, got {}",
                    value_kind(other)
                )));
            }
        }
    }

    Ok(collections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_objects() {
        for payload in [json!(null), json!(3), json!("data"), json!([])] {
            assert!(matches!(
                parse_import(&payload),
                Err(CoreError::InvalidPayload { .. })
            ));
        }
    }

    #[test]
    fn absent_and_null_collections_are_skipped() {
        let parsed = parse_import(&json!({
            "products": [{"id": 1}],
            "clients": null
        }))
        .unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].0, CollectionKind::Products);
        assert_eq!(parsed[0].1.len(), 1);
    }

    #[test]
    fn empty_array_replaces() {
        let parsed = parse_import(&json!({"sales": []})).unwrap();
        assert_eq!(parsed, vec![(CollectionKind::Sales, Vec::new())]);
    }

    #[test]
    fn wrong_collection_shape_is_rejected() {
        let err = parse_import(&json!({"products": [], "clients": {"id": 1}})).unwrap_err();
        assert!(err.to_string().contains("clients"));

        let err = parse_import(&json!({"sales": [{"id": 1}, 7]})).unwrap_err();
        assert!(err.to_string().contains("element 1"));
    }

    #[test]
    fn export_payload_decodes_from_json() {
        let payload: ExportPayload = serde_json::from_value(json!({
            "version": "2.0.0",
            "timestamp": "2024-05-01T10:00:00.000Z",
            "products": [{"id": 1, "name": "Shirt"}]
        }))
        .unwrap();

        assert_eq!(payload.records(CollectionKind::Products).len(), 1);
        assert!(payload.sales.is_empty());
    }

    #[test]
    fn new_payload_carries_format_version() {
        let payload = ExportPayload::new(Vec::new(), Vec::new(), Vec::new());
        assert_eq!(payload.version, FORMAT_VERSION);
        assert!(payload.timestamp.ends_with('Z'));
    }
}
