//! Invalidation entry point.
//!
//! Turns mutation events into purge sets. Hook requests purge inline;
//! published events wait for the background loop.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::locale::LocaleSet;
use crate::domain::mutation::MutationEvent;

use super::consumer::CacheConsumer;
use super::events::EventQueue;
use super::keys::PurgeSet;
use super::paths::PathShapeTable;
use super::planner::plan_mutation;

pub struct InvalidationCoordinator {
    table: Arc<PathShapeTable>,
    locales: Arc<LocaleSet>,
    queue: Arc<EventQueue>,
    consumer: Arc<CacheConsumer>,
}

impl InvalidationCoordinator {
    pub fn new(
        table: Arc<PathShapeTable>,
        locales: Arc<LocaleSet>,
        consumer: Arc<CacheConsumer>,
    ) -> Self {
        Self {
            table,
            locales,
            queue: consumer.queue().clone(),
            consumer,
        }
    }

    /// The purge set for `event`, without queueing it.
    pub fn plan(&self, event: &MutationEvent) -> PurgeSet {
        plan_mutation(event, &self.table, &self.locales)
    }

    /// Queue `event` for the next consumption and return its purge set.
    pub fn publish(&self, event: MutationEvent) -> PurgeSet {
        let targets = self.plan(&event);
        self.queue.publish(event, targets.clone());
        targets
    }

    /// Purge the targets of `event` and return them.
    ///
    /// The event bypasses the queue, so its purge has finished when this
    /// returns regardless of any backlog or concurrent consumption.
    #[instrument(
        skip(self, event),
        fields(
            collection = %event.collection,
            document_id = %event.id,
            locale = %event.locale,
            transition = %event.transition(),
        )
    )]
    pub async fn on_mutation(&self, event: MutationEvent) -> PurgeSet {
        let targets = self.plan(&event);
        let outcome = self.consumer.execute(&targets).await;
        debug!(
            targets = targets.len(),
            purged = outcome.purged,
            failed_purgers = outcome.failed,
            "Mutation purged inline"
        );
        targets
    }

    pub fn consumer(&self) -> &Arc<CacheConsumer> {
        &self.consumer
    }

    pub fn table(&self) -> &PathShapeTable {
        &self.table
    }

    pub fn locales(&self) -> &LocaleSet {
        &self.locales
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::cache::keys::{CacheKey, PurgeTarget, StoreKey};
    use crate::cache::middleware::CacheState;
    use crate::cache::purger::{LocalPurger, Purger};
    use crate::cache::store::CachedResponse;
    use crate::cache::CacheConfig;
    use crate::domain::document::{DocumentId, DocumentStatus};
    use crate::domain::locale::Locale;

    use super::*;

    fn setup() -> (InvalidationCoordinator, CacheState) {
        setup_with_batch_limit(100)
    }

    fn setup_with_batch_limit(batch_limit: usize) -> (InvalidationCoordinator, CacheState) {
        let locales = Arc::new(LocaleSet::new(["sl", "en"], "sl").expect("valid locales"));
        let cache = CacheState::new(CacheConfig::default(), locales.clone());
        let queue = Arc::new(EventQueue::new());
        let local: Arc<dyn Purger> =
            Arc::new(LocalPurger::new(cache.store.clone(), cache.registry.clone()));
        let consumer = Arc::new(CacheConsumer::new(batch_limit, queue, vec![local]));
        let coordinator =
            InvalidationCoordinator::new(Arc::new(PathShapeTable::standard(5)), locales, consumer);
        (coordinator, cache)
    }

    fn cache_path(cache: &CacheState, path: &str) -> StoreKey {
        let key = StoreKey {
            key: CacheKey::new(path, Locale::parse("en").expect("valid locale")),
            variant: 0,
        };
        cache.store.insert(
            key.clone(),
            CachedResponse::new(200, vec![], bytes::Bytes::from_static(b"cached")),
        );
        cache
            .registry
            .register(key.clone(), HashSet::from([PurgeTarget::Path(key.key.clone())]));
        key
    }

    #[tokio::test]
    async fn on_mutation_purges_before_returning() {
        let (coordinator, cache) = setup();
        let detail = cache_path(&cache, "/en/posts/hello");
        let listing = cache_path(&cache, "/en/posts");
        let unrelated = cache_path(&cache, "/en/about");

        let event = MutationEvent::change(
            "posts",
            DocumentId::Number(1),
            Locale::parse("en").expect("valid locale"),
            DocumentStatus::Published,
        )
        .with_slug("hello");
        let targets = coordinator.on_mutation(event).await;

        assert!(targets.contains_path("/en/posts/hello"));
        assert!(cache.store.get(&detail).is_none());
        assert!(cache.store.get(&listing).is_none());
        assert!(cache.store.get(&unrelated).is_some());
    }

    #[tokio::test]
    async fn publish_defers_until_consumed() {
        let (coordinator, cache) = setup();
        let detail = cache_path(&cache, "/en/posts/hello");

        let event = MutationEvent::change(
            "posts",
            DocumentId::Number(1),
            Locale::parse("en").expect("valid locale"),
            DocumentStatus::Published,
        )
        .with_slug("hello");
        coordinator.publish(event);

        assert!(cache.store.get(&detail).is_some());
        assert!(coordinator.consumer().consume().await);
        assert!(cache.store.get(&detail).is_none());
    }

    #[tokio::test]
    async fn on_mutation_purges_despite_a_queued_backlog() {
        let (coordinator, cache) = setup_with_batch_limit(1);
        let detail = cache_path(&cache, "/en/posts/hello");
        let en = Locale::parse("en").expect("valid locale");

        coordinator.publish(
            MutationEvent::change(
                "events",
                DocumentId::Number(9),
                en.clone(),
                DocumentStatus::Published,
            )
            .with_slug("meetup"),
        );
        let event =
            MutationEvent::change("posts", DocumentId::Number(1), en, DocumentStatus::Published)
                .with_slug("hello");
        let targets = coordinator.on_mutation(event).await;

        assert!(targets.contains_path("/en/posts/hello"));
        assert!(cache.store.get(&detail).is_none());
        assert_eq!(coordinator.consumer().queue().len(), 1, "backlog left for the loop");
    }
}
