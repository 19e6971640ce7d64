//! Cache event system.
//!
//! Mutation events are queued together with the purge set planned for them
//! and drained by the [`CacheConsumer`](super::CacheConsumer).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::gauge;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::domain::mutation::MutationEvent;

use super::keys::PurgeSet;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::events";
pub const METRIC_EVENT_QUEUE_LEN: &str = "vellum_cache_event_queue_len";

/// Monotonic epoch for ordering events within this process.
pub type Epoch = u64;

#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Unique identifier for idempotency (UUIDv4).
    pub id: Uuid,
    pub epoch: Epoch,
    pub mutation: MutationEvent,
    /// Targets planned when the event was published.
    pub targets: PurgeSet,
    pub timestamp: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(mutation: MutationEvent, targets: PurgeSet, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            mutation,
            targets,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// In-memory FIFO of pending invalidations.
pub struct EventQueue {
    queue: Mutex<VecDeque<CacheEvent>>,
    epoch_counter: AtomicU64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            epoch_counter: AtomicU64::new(0),
        }
    }

    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Enqueue a mutation with its planned targets; returns the event id.
    pub fn publish(&self, mutation: MutationEvent, targets: PurgeSet) -> Uuid {
        let event = CacheEvent::new(mutation, targets, self.next_epoch());
        let id = event.id;

        info!(
            event_id = %event.id,
            event_epoch = event.epoch,
            collection = %event.mutation.collection,
            document_id = %event.mutation.id,
            locale = %event.mutation.locale,
            transition = %event.mutation.transition(),
            targets = %event.targets,
            "Cache event enqueued"
        );

        let mut queue = mutex_lock(&self.queue, SOURCE, "publish");
        queue.push_back(event);
        gauge!(METRIC_EVENT_QUEUE_LEN).set(queue.len() as f64);
        id
    }

    /// Drain up to `limit` events in FIFO order.
    pub fn drain(&self, limit: usize) -> Vec<CacheEvent> {
        let mut queue = mutex_lock(&self.queue, SOURCE, "drain");
        let count = limit.min(queue.len());
        let events: Vec<CacheEvent> = queue.drain(..count).collect();
        gauge!(METRIC_EVENT_QUEUE_LEN).set(queue.len() as f64);
        events
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.queue, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        mutex_lock(&self.queue, SOURCE, "clear").clear();
        gauge!(METRIC_EVENT_QUEUE_LEN).set(0.0);
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use crate::domain::document::{DocumentId, DocumentStatus};
    use crate::domain::locale::Locale;

    use super::*;

    fn mutation(id: i64) -> MutationEvent {
        MutationEvent::change(
            "posts",
            DocumentId::Number(id),
            Locale::parse("en").expect("valid locale"),
            DocumentStatus::Published,
        )
        .with_slug(format!("post-{id}"))
    }

    #[test]
    fn epoch_monotonicity() {
        let queue = EventQueue::new();
        let e1 = queue.next_epoch();
        let e2 = queue.next_epoch();
        assert!(e1 < e2);
    }

    #[test]
    fn publish_and_drain_in_fifo_order() {
        let queue = EventQueue::new();
        queue.publish(mutation(1), PurgeSet::new());
        queue.publish(mutation(2), PurgeSet::new());
        queue.publish(mutation(3), PurgeSet::new());
        assert_eq!(queue.len(), 3);

        let events = queue.drain(2);
        assert_eq!(events.len(), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(events[0].mutation.id, DocumentId::Number(1));
        assert_eq!(events[1].mutation.id, DocumentId::Number(2));
        assert!(events[0].epoch < events[1].epoch);
    }

    #[test]
    fn drain_more_than_available() {
        let queue = EventQueue::new();
        queue.publish(mutation(1), PurgeSet::new());

        assert_eq!(queue.drain(100).len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_queue() {
        let queue = EventQueue::new();
        queue.publish(mutation(1), PurgeSet::new());
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn event_queue_recovers_from_poisoned_lock() {
        let queue = EventQueue::new();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = queue.queue.lock().expect("queue lock should be acquired");
            panic!("poison queue lock");
        }));

        queue.publish(mutation(1), PurgeSet::new());
        assert_eq!(queue.len(), 1);
    }
}
