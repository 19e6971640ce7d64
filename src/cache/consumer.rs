//! Cache consumer for executing consumption plans.
//!
//! Drains queued events, merges their purge sets and hands the result to
//! every configured purger.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use metrics::{counter, histogram};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::events::EventQueue;
use super::keys::PurgeSet;
use super::planner::ConsumptionPlan;
use super::purger::Purger;

pub const METRIC_CACHE_CONSUME_MS: &str = "vellum_cache_consume_ms";
pub const METRIC_CACHE_PURGE_FAILED: &str = "vellum_cache_purge_failed_total";

/// Result of running one purge set through every purger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeOutcome {
    /// Entries or targets the purgers reported as purged.
    pub purged: usize,
    /// Purgers that failed; their outputs age out through the max age.
    pub failed: usize,
}

pub struct CacheConsumer {
    batch_limit: usize,
    queue: Arc<EventQueue>,
    purgers: Vec<Arc<dyn Purger>>,
}

impl CacheConsumer {
    pub fn new(batch_limit: usize, queue: Arc<EventQueue>, purgers: Vec<Arc<dyn Purger>>) -> Self {
        Self {
            batch_limit: batch_limit.max(1),
            queue,
            purgers,
        }
    }

    /// Consume pending events and execute the merged plan.
    ///
    /// Returns true if any events were processed.
    #[instrument(skip(self))]
    pub async fn consume(&self) -> bool {
        let started_at = Instant::now();
        let events = self.queue.drain(self.batch_limit);
        if events.is_empty() {
            return false;
        }

        let event_count = events.len();
        let event_ids: Vec<Uuid> = events.iter().map(|event| event.id).collect();
        let plan = ConsumptionPlan::from_events(events);

        info!(
            event_count,
            event_ids = ?event_ids,
            plan = %plan,
            "Cache consumption starting"
        );

        let outcome = self.execute(&plan.targets).await;

        info!(
            event_count,
            targets = plan.targets.len(),
            purged = outcome.purged,
            failed_purgers = outcome.failed,
            "Cache consumption complete"
        );

        histogram!(METRIC_CACHE_CONSUME_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        true
    }

    /// Run `targets` through every purger concurrently.
    ///
    /// Failures are logged and counted, never returned.
    pub async fn execute(&self, targets: &PurgeSet) -> PurgeOutcome {
        if targets.is_empty() {
            return PurgeOutcome::default();
        }

        let results = join_all(self.purgers.iter().map(|purger| async move {
            (purger.name().to_string(), purger.purge(targets).await)
        }))
        .await;

        let mut outcome = PurgeOutcome::default();
        for (purger, result) in results {
            match result {
                Ok(purged) => outcome.purged += purged,
                Err(err) => {
                    outcome.failed += 1;
                    warn!(
                        purger = %purger,
                        error = %err,
                        targets = %targets,
                        "Purge failed; affected outputs expire after max age"
                    );
                    counter!(METRIC_CACHE_PURGE_FAILED, "purger" => purger).increment(1);
                }
            }
        }
        outcome
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::cache::purger::PurgeError;
    use crate::domain::document::{DocumentId, DocumentStatus};
    use crate::domain::locale::Locale;
    use crate::domain::mutation::MutationEvent;

    use super::*;

    #[derive(Default)]
    struct RecordingPurger {
        seen: Mutex<Vec<PurgeSet>>,
    }

    #[async_trait]
    impl Purger for RecordingPurger {
        fn name(&self) -> &str {
            "recording"
        }

        async fn purge(&self, targets: &PurgeSet) -> Result<usize, PurgeError> {
            self.seen.lock().expect("lock").push(targets.clone());
            Ok(targets.len())
        }
    }

    struct FailingPurger;

    #[async_trait]
    impl Purger for FailingPurger {
        fn name(&self) -> &str {
            "failing"
        }

        async fn purge(&self, _targets: &PurgeSet) -> Result<usize, PurgeError> {
            Err(PurgeError::Status {
                endpoint: "http://downstream.test/revalidate".to_string(),
                status: 503,
            })
        }
    }

    fn en() -> Locale {
        Locale::parse("en").expect("valid locale")
    }

    fn publish(queue: &EventQueue, path: &str) {
        let mut set = PurgeSet::new();
        set.insert_path(path, en());
        queue.publish(
            MutationEvent::change("posts", DocumentId::Number(1), en(), DocumentStatus::Published),
            set,
        );
    }

    #[tokio::test]
    async fn consume_merges_batch_and_reaches_all_purgers() {
        let queue = Arc::new(EventQueue::new());
        let recording = Arc::new(RecordingPurger::default());
        let consumer = CacheConsumer::new(
            10,
            queue.clone(),
            vec![recording.clone() as Arc<dyn Purger>, Arc::new(FailingPurger)],
        );

        publish(&queue, "/en/posts/a");
        publish(&queue, "/en/posts/b");
        publish(&queue, "/en/posts/a");

        assert!(consumer.consume().await);
        assert!(queue.is_empty());

        let seen = recording.seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].len(), 2);
    }

    #[tokio::test]
    async fn consume_on_empty_queue_is_a_no_op() {
        let queue = Arc::new(EventQueue::new());
        let consumer = CacheConsumer::new(10, queue, vec![]);
        assert!(!consumer.consume().await);
    }

    #[tokio::test]
    async fn failures_are_counted_not_propagated() {
        let consumer = CacheConsumer::new(
            10,
            Arc::new(EventQueue::new()),
            vec![
                Arc::new(FailingPurger) as Arc<dyn Purger>,
                Arc::new(RecordingPurger::default()),
            ],
        );
        let mut set = PurgeSet::new();
        set.insert_path("/en", en());

        let outcome = consumer.execute(&set).await;
        assert_eq!(outcome, PurgeOutcome { purged: 1, failed: 1 });
    }

    #[tokio::test]
    async fn batch_limit_bounds_each_consumption() {
        let queue = Arc::new(EventQueue::new());
        let consumer = CacheConsumer::new(1, queue.clone(), vec![]);
        publish(&queue, "/en/a");
        publish(&queue, "/en/b");

        assert!(consumer.consume().await);
        assert_eq!(queue.len(), 1);
    }
}
