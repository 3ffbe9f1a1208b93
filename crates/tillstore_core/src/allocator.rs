//! Persistent identifier allocation.

use crate::adapter::KvAdapter;
use crate::error::{CoreError, CoreResult};
use crate::types::{RecordId, WriteLock, NEXT_ID_KEY};
use std::sync::Arc;
use tracing::debug;

/// Issues monotonically increasing record identifiers.
///
/// The counter lives under the `nextId` key and starts at the configured
/// floor. An identifier is only handed out once the incremented counter is
/// persisted, so a failed write can never cause the same id to be issued
/// twice.
#[derive(Debug)]
pub struct IdAllocator {
    adapter: Arc<KvAdapter>,
    floor: i64,
    lock: WriteLock,
}

impl IdAllocator {
    pub(crate) fn new(adapter: Arc<KvAdapter>, floor: i64, lock: WriteLock) -> Self {
        Self {
            adapter,
            floor,
            lock,
        }
    }

    /// Allocates the next identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the incremented counter cannot be persisted, or
    /// if the counter already sits at `i64::MAX`.
    pub fn next_id(&self) -> CoreResult<RecordId> {
        let _guard = self.lock.lock();

        let current = self.peek();
        let next = current
            .as_i64()
            .checked_add(1)
            .ok_or(CoreError::IdSpaceExhausted {
                last: current.as_i64(),
            })?;
        self.adapter.save(NEXT_ID_KEY, &next)?;

        debug!(id = %current, "allocated id");
        Ok(current)
    }

    /// Returns the identifier the next call to [`next_id`](Self::next_id)
    /// would hand out, without consuming it.
    #[must_use]
    pub fn peek(&self) -> RecordId {
        RecordId::new(self.adapter.load(NEXT_ID_KEY, self.floor))
    }

    /// Returns the configured floor.
    #[must_use]
    pub fn floor(&self) -> i64 {
        self.floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::ReentrantMutex;
    use tillstore_storage::{InMemoryBackend, KeyValueBackend};

    fn allocator(backend: Arc<InMemoryBackend>, floor: i64) -> IdAllocator {
        let adapter = Arc::new(KvAdapter::new(backend, ""));
        IdAllocator::new(adapter, floor, Arc::new(ReentrantMutex::new(())))
    }

    #[test]
    fn starts_at_floor_and_increments() {
        let backend = Arc::new(InMemoryBackend::new());
        let ids = allocator(backend.clone(), 1000);

        let issued: Vec<i64> = (0..5).map(|_| ids.next_id().unwrap().as_i64()).collect();
        assert_eq!(issued, vec![1000, 1001, 1002, 1003, 1004]);
        assert_eq!(backend.get("nextId").unwrap().as_deref(), Some("1005"));
    }

    #[test]
    fn resumes_from_persisted_counter() {
        let backend = Arc::new(InMemoryBackend::with_entries([("nextId", "2040")]));
        let ids = allocator(backend, 1000);
        assert_eq!(ids.next_id().unwrap(), RecordId::new(2040));
        assert_eq!(ids.peek(), RecordId::new(2041));
    }

    #[test]
    fn peek_does_not_consume() {
        let ids = allocator(Arc::new(InMemoryBackend::new()), 1);
        assert_eq!(ids.peek(), RecordId::new(1));
        assert_eq!(ids.peek(), RecordId::new(1));
        assert_eq!(ids.next_id().unwrap(), RecordId::new(1));
        assert_eq!(ids.floor(), 1);
    }

    #[test]
    fn failed_save_issues_nothing() {
        // Room for "nextId" + 4 digits only.
        let backend = Arc::new(InMemoryBackend::with_quota(10));
        backend.put("nextId", "9999").unwrap();
        let ids = allocator(backend.clone(), 1000);

        assert!(ids.next_id().is_err());
        assert_eq!(ids.peek(), RecordId::new(9999));
    }

    #[test]
    fn exhausted_counter_is_an_error() {
        let max = i64::MAX.to_string();
        let backend = Arc::new(InMemoryBackend::with_entries([("nextId", max.as_str())]));
        let ids = allocator(backend.clone(), 1000);

        assert!(matches!(
            ids.next_id(),
            Err(CoreError::IdSpaceExhausted { last: i64::MAX })
        ));
        assert_eq!(backend.get("nextId").unwrap(), Some(max));

        let ids = allocator(Arc::new(InMemoryBackend::new()), i64::MAX);
        assert!(ids.next_id().is_err());
    }

    #[test]
    fn corrupt_counter_falls_back_to_floor() {
        let backend = Arc::new(InMemoryBackend::with_entries([("nextId", "oops")]));
        let ids = allocator(backend, 1000);
        assert_eq!(ids.next_id().unwrap(), RecordId::new(1000));
    }
}
