//! Change feed for observing collection writes.
//!
//! Every successful collection write publishes a [`ChangeEvent`] carrying
//! the collection and its complete persisted contents. This lets
//! dashboards and screens refresh without polling storage.
//!
//! Delivery is synchronous and in-process. There is no replay: a
//! subscriber only sees writes made after it registered.
//!
//! # Usage
//!
//! ```rust
//! use tillstore_core::{DataManager, Product};
//!
//! let store = DataManager::open_in_memory().unwrap();
//! let changes = store.subscribe();
//!
//! store.add_product(Product::new("Shirt", 10)).unwrap();
//!
//! let event = changes.try_recv().unwrap();
//! assert_eq!(event.collection.name(), "products");
//! assert_eq!(event.data.len(), 1);
//! ```

use crate::record::Record;
use crate::types::{CollectionKind, SequenceNumber};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tracing::trace;

/// A single change event.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Position of this write among all writes seen by the feed.
    pub sequence: SequenceNumber,
    /// The collection that changed.
    pub collection: CollectionKind,
    /// The collection's persisted contents after the write.
    pub data: Arc<[Record]>,
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
}

/// Handle identifying a registered subscriber or listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A channel subscription to the change feed.
///
/// Dereferences to the underlying [`Receiver`]. Dropping the subscription
/// unregisters it on the next publish; [`ChangeFeed::unsubscribe`] does so
/// immediately.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: Receiver<ChangeEvent>,
}

impl Subscription {
    /// Returns the subscription's handle.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Deref for Subscription {
    type Target = Receiver<ChangeEvent>;

    fn deref(&self) -> &Self::Target {
        &self.receiver
    }
}

type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Distributes change events to channel subscribers and callback listeners.
///
/// The change feed:
/// - Publishes only successful writes
/// - Preserves write order
/// - Supports multiple subscribers of both kinds
/// - Is thread-safe
pub struct ChangeFeed {
    subscribers: RwLock<Vec<(SubscriptionId, Sender<ChangeEvent>)>>,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
    sequence: AtomicU64,
}

impl ChangeFeed {
    /// Creates a new change feed.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            sequence: AtomicU64::new(0),
        }
    }

    fn allocate_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed))
    }

    /// Subscribes a channel to the feed.
    ///
    /// The returned receiver gets every event published from now on. It
    /// should be drained regularly to avoid unbounded memory growth.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel();
        let id = self.allocate_id();
        self.subscribers.write().push((id, tx));
        Subscription { id, receiver: rx }
    }

    /// Registers a callback invoked synchronously for every event.
    ///
    /// The callback runs on the writing thread while the write lock is
    /// held; it may call back into the data manager.
    pub fn on_change<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = self.allocate_id();
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Removes a subscriber or listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut removed = false;

        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        removed |= subscribers.len() != before;
        drop(subscribers);

        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        removed |= listeners.len() != before;

        removed
    }

    /// Publishes the new contents of `collection`.
    ///
    /// Called after the write is persisted. Returns the published event.
    pub fn publish(&self, collection: CollectionKind, data: Vec<Record>) -> ChangeEvent {
        let sequence = SequenceNumber::new(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        let event = ChangeEvent {
            sequence,
            collection,
            data: data.into(),
            timestamp: Utc::now(),
        };
        self.emit(&event);
        event
    }

    /// Delivers an event to all subscribers and listeners.
    pub fn emit(&self, event: &ChangeEvent) {
        trace!(sequence = %event.sequence, collection = %event.collection, "emitting change");

        // Send to subscribers (remove disconnected ones)
        self.subscribers
            .write()
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());

        // Listeners may unsubscribe from inside the callback
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    /// Returns the sequence number of the latest published event.
    pub fn latest_sequence(&self) -> SequenceNumber {
        SequenceNumber::new(self.sequence.load(Ordering::Relaxed))
    }

    /// Returns the number of channel subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Returns the number of callback listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("subscribers", &self.subscriber_count())
            .field("listeners", &self.listener_count())
            .field("sequence", &self.latest_sequence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    fn records(ids: &[i64]) -> Vec<Record> {
        ids.iter()
            .map(|id| Record::from_value(json!({ "id": id })).unwrap())
            .collect()
    }

    #[test]
    fn publish_and_receive() {
        let feed = ChangeFeed::new();
        let rx = feed.subscribe();

        let event = feed.publish(CollectionKind::Products, records(&[1, 2]));

        let received = rx.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(received, event);
        assert_eq!(received.data.len(), 2);
        assert_eq!(received.collection, CollectionKind::Products);
    }

    #[test]
    fn multiple_subscribers() {
        let feed = ChangeFeed::new();
        let rx1 = feed.subscribe();
        let rx2 = feed.subscribe();

        let event = feed.publish(CollectionKind::Sales, records(&[1]));

        assert_eq!(rx1.recv().unwrap(), event);
        assert_eq!(rx2.recv().unwrap(), event);
    }

    #[test]
    fn late_subscriber_sees_no_replay() {
        let feed = ChangeFeed::new();
        feed.publish(CollectionKind::Clients, records(&[1]));

        let rx = feed.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn subscriber_cleanup() {
        let feed = ChangeFeed::new();
        let rx = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        drop(rx);

        feed.publish(CollectionKind::Products, Vec::new());
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribe_channel_and_listener() {
        let feed = ChangeFeed::new();
        let sub = feed.subscribe();
        let listener = feed.on_change(|_| {});

        assert!(feed.unsubscribe(sub.id()));
        assert!(feed.unsubscribe(listener));
        assert!(!feed.unsubscribe(listener));
        assert_eq!(feed.subscriber_count(), 0);
        assert_eq!(feed.listener_count(), 0);

        feed.publish(CollectionKind::Products, Vec::new());
        assert!(sub.try_recv().is_err());
    }

    #[test]
    fn listeners_run_synchronously() {
        let feed = ChangeFeed::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&seen);
        feed.on_change(move |event| {
            counter.fetch_add(event.data.len(), Ordering::SeqCst);
        });

        feed.publish(CollectionKind::Products, records(&[1, 2, 3]));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn sequence_orders_writes_across_collections() {
        let feed = ChangeFeed::new();
        let rx = feed.subscribe();

        feed.publish(CollectionKind::Sales, Vec::new());
        feed.publish(CollectionKind::Products, Vec::new());

        let first = rx.recv().unwrap();
        let second = rx.recv().unwrap();
        assert_eq!(first.collection, CollectionKind::Sales);
        assert!(first.sequence < second.sequence);
        assert_eq!(feed.latest_sequence(), SequenceNumber::new(2));
    }

    #[test]
    fn threaded_subscribe() {
        let feed = Arc::new(ChangeFeed::new());
        let rx = feed.subscribe();

        let feed_clone = Arc::clone(&feed);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            feed_clone.publish(CollectionKind::Products, records(&[42]));
        });

        let received = rx.recv_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(received.data[0].id().map(|id| id.as_i64()), Some(42));

        handle.join().unwrap();
    }
}
