//! Generic collection implementation.

use crate::adapter::KvAdapter;
use crate::allocator::IdAllocator;
use crate::change_feed::ChangeFeed;
use crate::collection::dedup::dedup_first_wins;
use crate::error::CoreResult;
use crate::record::{value_kind, IdKey, Record};
use crate::types::{iso_now, CollectionKind, WriteLock, LAST_UPDATE_KEY};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One persisted collection of records.
///
/// `Collection` is the only path by which records reach storage. Every
/// write goes through [`save_all`](Self::save_all), which:
///
/// 1. drops records whose id already appeared earlier in the batch
/// 2. persists the survivors under the collection's key
/// 3. stamps the store's `lastUpdate`
/// 4. publishes a change event with the persisted contents
///
/// so no code path can persist two records with the same id.
///
/// # Example
///
/// ```rust
/// use tillstore_core::{CollectionKind, DataManager};
/// use serde_json::json;
///
/// let store = DataManager::open_in_memory().unwrap();
/// let products = store.collection(CollectionKind::Products);
///
/// let saved = products
///     .save_all(vec![
///         json!({"id": 1, "name": "first"}).try_into().unwrap(),
///         json!({"id": 1, "name": "second"}).try_into().unwrap(),
///     ])
///     .unwrap();
/// assert_eq!(saved.len(), 1);
/// assert_eq!(saved[0].get("name"), Some(&json!("first")));
/// ```
#[derive(Debug)]
pub struct Collection {
    kind: CollectionKind,
    adapter: Arc<KvAdapter>,
    allocator: Arc<IdAllocator>,
    feed: Arc<ChangeFeed>,
    lock: WriteLock,
}

impl Collection {
    pub(crate) fn new(
        kind: CollectionKind,
        adapter: Arc<KvAdapter>,
        allocator: Arc<IdAllocator>,
        feed: Arc<ChangeFeed>,
        lock: WriteLock,
    ) -> Self {
        Self {
            kind,
            adapter,
            allocator,
            feed,
            lock,
        }
    }

    /// Returns which collection this is.
    #[must_use]
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Returns all persisted records, or an empty list if the collection
    /// was never written.
    ///
    /// Stored elements that aren't JSON objects are skipped with a warning.
    pub fn get_all(&self) -> Vec<Record> {
        let stored: Vec<Value> = self.adapter.load(self.kind.storage_key(), Vec::new());

        let mut records = Vec::with_capacity(stored.len());
        for (index, value) in stored.into_iter().enumerate() {
            match value {
                Value::Object(map) => records.push(Record::from(map)),
                other => warn!(
                    collection = %self.kind,
                    index,
                    "skipping stored element that is {}",
                    value_kind(&other)
                ),
            }
        }

        debug!(collection = %self.kind, count = records.len(), "loaded");
        records
    }

    /// Returns the record with the given id.
    pub fn find(&self, id: impl Into<IdKey>) -> Option<Record> {
        let key = id.into();
        self.get_all().into_iter().find(|r| r.id_key() == key)
    }

    /// Replaces the collection with `records`, deduplicated by id.
    ///
    /// Returns the sequence actually persisted, so callers can see which
    /// records were dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written. Nothing is
    /// published in that case and the stored collection is unchanged.
    pub fn save_all(&self, records: Vec<Record>) -> CoreResult<Vec<Record>> {
        let _guard = self.lock.lock();

        let (clean, dropped) = dedup_first_wins(records);
        self.adapter.save(self.kind.storage_key(), &clean)?;

        if let Err(e) = self.adapter.save(LAST_UPDATE_KEY, &iso_now()) {
            warn!(error = %e, "failed to update last modification time");
        }

        info!(
            collection = %self.kind,
            count = clean.len(),
            duplicates_removed = dropped,
            "saved"
        );

        self.feed.publish(self.kind, clean.clone());
        Ok(clean)
    }

    /// Inserts a record, or merges it into the record with the same id.
    ///
    /// A record without an id gets one from the allocator. When a record
    /// with the same id exists, the new fields are shallow-merged over it;
    /// fields the new record lacks are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if id allocation or the write fails.
    pub fn add(&self, mut record: Record) -> CoreResult<Vec<Record>> {
        let _guard = self.lock.lock();

        if !record.has_id() {
            record.set_id(self.allocator.next_id()?);
        }

        let key = record.id_key();
        let mut records = self.get_all();

        match records.iter_mut().find(|r| r.id_key() == key) {
            Some(existing) => {
                existing.merge_from(record);
                info!(collection = %self.kind, id = %key, "record updated");
            }
            None => {
                records.push(record);
                info!(collection = %self.kind, id = %key, "record added");
            }
        }

        self.save_all(records)
    }

    /// Deletes the record with the given id.
    ///
    /// Deleting an id that isn't present is a no-op: a warning is logged,
    /// nothing is written and the unchanged sequence is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn remove(&self, id: impl Into<IdKey>) -> CoreResult<Vec<Record>> {
        let _guard = self.lock.lock();

        let key = id.into();
        let records = self.get_all();
        let before = records.len();
        let remaining: Vec<Record> = records.into_iter().filter(|r| r.id_key() != key).collect();

        if remaining.len() == before {
            warn!(collection = %self.kind, id = %key, "record not found for delete");
            return Ok(remaining);
        }

        info!(collection = %self.kind, id = %key, "record deleted");
        self.save_all(remaining)
    }

    /// Applies `f` to the record with the given id and saves the collection.
    ///
    /// An unknown id is a no-op like [`remove`](Self::remove).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn update<F>(&self, id: impl Into<IdKey>, f: F) -> CoreResult<Vec<Record>>
    where
        F: FnOnce(&mut Record),
    {
        let _guard = self.lock.lock();

        let key = id.into();
        let mut records = self.get_all();

        match records.iter_mut().find(|r| r.id_key() == key) {
            Some(record) => f(record),
            None => {
                warn!(collection = %self.kind, id = %key, "record not found for update");
                return Ok(records);
            }
        }

        self.save_all(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordId;
    use parking_lot::ReentrantMutex;
    use serde_json::json;
    use tillstore_storage::{InMemoryBackend, KeyValueBackend};

    struct Fixture {
        backend: Arc<InMemoryBackend>,
        feed: Arc<ChangeFeed>,
        products: Collection,
    }

    fn fixture_with(backend: InMemoryBackend) -> Fixture {
        let backend = Arc::new(backend);
        let adapter = Arc::new(KvAdapter::new(backend.clone(), ""));
        let lock: WriteLock = Arc::new(ReentrantMutex::new(()));
        let allocator = Arc::new(IdAllocator::new(adapter.clone(), 1000, lock.clone()));
        let feed = Arc::new(ChangeFeed::new());
        let products = Collection::new(
            CollectionKind::Products,
            adapter,
            allocator,
            feed.clone(),
            lock,
        );
        Fixture {
            backend,
            feed,
            products,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(InMemoryBackend::new())
    }

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn get_all_defaults_to_empty() {
        let fx = fixture();
        assert!(fx.products.get_all().is_empty());
        assert!(fx.backend.get("products").unwrap().is_none());
    }

    #[test]
    fn save_all_first_wins() {
        let fx = fixture();
        let saved = fx
            .products
            .save_all(vec![
                record(json!({"id": 1, "a": "x"})),
                record(json!({"id": 1, "a": "y"})),
            ])
            .unwrap();

        assert_eq!(saved, vec![record(json!({"id": 1, "a": "x"}))]);
        assert_eq!(fx.products.get_all(), saved);
    }

    #[test]
    fn save_all_stamps_last_update_and_publishes() {
        let fx = fixture();
        let rx = fx.feed.subscribe();

        fx.products.save_all(vec![record(json!({"id": 1}))]).unwrap();

        assert!(fx.backend.get("lastUpdate").unwrap().is_some());
        let event = rx.try_recv().unwrap();
        assert_eq!(event.collection, CollectionKind::Products);
        assert_eq!(event.data.len(), 1);
    }

    #[test]
    fn failed_save_publishes_nothing() {
        let fx = fixture_with(InMemoryBackend::with_quota(64));
        fx.products.save_all(vec![record(json!({"id": 1}))]).unwrap();
        let rx = fx.feed.subscribe();

        let big = record(json!({"id": 2, "blob": "x".repeat(200)}));
        assert!(fx.products.save_all(vec![big]).is_err());

        assert!(rx.try_recv().is_err());
        assert_eq!(fx.products.get_all(), vec![record(json!({"id": 1}))]);
    }

    #[test]
    fn add_assigns_id() {
        let fx = fixture();
        let saved = fx.products.add(record(json!({"name": "Cap"}))).unwrap();
        assert_eq!(saved[0].id(), Some(RecordId::new(1000)));

        let saved = fx.products.add(record(json!({"name": "Hat"}))).unwrap();
        assert_eq!(saved[1].id(), Some(RecordId::new(1001)));
    }

    #[test]
    fn add_merges_existing() {
        let fx = fixture();
        fx.products
            .add(record(json!({"id": 5, "name": "Shirt", "stock": 10})))
            .unwrap();

        let saved = fx.products.add(record(json!({"id": 5, "stock": 4}))).unwrap();
        assert_eq!(
            saved,
            vec![record(json!({"id": 5, "name": "Shirt", "stock": 4}))]
        );
    }

    #[test]
    fn add_appends_in_order() {
        let fx = fixture();
        fx.products.add(record(json!({"id": 2}))).unwrap();
        let saved = fx.products.add(record(json!({"id": 1}))).unwrap();
        let ids: Vec<_> = saved.iter().map(|r| r.id_key()).collect();
        assert_eq!(ids, vec![IdKey::Int(2), IdKey::Int(1)]);
    }

    #[test]
    fn remove_existing() {
        let fx = fixture();
        fx.products
            .save_all(vec![record(json!({"id": 1})), record(json!({"id": 2}))])
            .unwrap();

        let saved = fx.products.remove(RecordId::new(1)).unwrap();
        assert_eq!(saved, vec![record(json!({"id": 2}))]);
    }

    #[test]
    fn remove_missing_is_noop_without_write() {
        let fx = fixture();
        fx.products.save_all(vec![record(json!({"id": 1}))]).unwrap();
        let rx = fx.feed.subscribe();

        let saved = fx.products.remove(99).unwrap();
        assert_eq!(saved, vec![record(json!({"id": 1}))]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn update_applies_closure() {
        let fx = fixture();
        fx.products
            .save_all(vec![record(json!({"id": 3, "stock": 1}))])
            .unwrap();

        fx.products
            .update(3, |r| {
                r.insert("stock", 12);
            })
            .unwrap();
        assert_eq!(fx.products.find(3).unwrap().get_i64("stock"), Some(12));
    }

    #[test]
    fn update_missing_is_noop() {
        let fx = fixture();
        let mut called = false;
        let saved = fx.products.update(3, |_| called = true).unwrap();
        assert!(saved.is_empty());
        assert!(!called);
    }

    #[test]
    fn legacy_string_ids_are_addressable() {
        let fx = fixture_with(InMemoryBackend::with_entries([(
            "products",
            r#"[{"id":"sku-1","stock":2}]"#,
        )]));
        let saved = fx
            .products
            .remove(IdKey::Other("\"sku-1\"".into()))
            .unwrap();
        assert!(saved.is_empty());
    }

    #[test]
    fn non_object_elements_are_skipped() {
        let fx = fixture_with(InMemoryBackend::with_entries([(
            "products",
            r#"[{"id":1}, 7, "x", {"id":2}]"#,
        )]));
        assert_eq!(fx.products.get_all().len(), 2);
    }

    #[test]
    fn corrupt_collection_reads_empty() {
        let fx = fixture_with(InMemoryBackend::with_entries([("products", "[{oops")]));
        assert!(fx.products.get_all().is_empty());
    }
}
