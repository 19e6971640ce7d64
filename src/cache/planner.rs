//! Purge planning.
//!
//! [`plan_mutation`] turns one mutation into the set of outputs it may have
//! made stale. [`ConsumptionPlan`] merges the planned sets of a drained batch.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use uuid::Uuid;

use crate::domain::document::DocumentStatus;
use crate::domain::locale::{Locale, LocaleSet};
use crate::domain::mutation::{MutationEvent, Operation};

use super::events::CacheEvent;
use super::keys::PurgeSet;
use super::paths::{PathShape, PathShapeTable};

/// Plan the purge set for one mutation.
///
/// Detail paths are purged in the event's locale only; listing pages are
/// purged in every locale since listings show documents of all locales.
pub fn plan_mutation(
    event: &MutationEvent,
    table: &PathShapeTable,
    locales: &LocaleSet,
) -> PurgeSet {
    let shape = table.shape_for(&event.collection);
    let mut set = PurgeSet::new();

    let published =
        |status: Option<DocumentStatus>| status.is_some_and(DocumentStatus::is_published);

    match event.operation {
        Operation::Change => {
            if event.status.is_published()
                && let Some(slug) = event.slug.as_deref()
            {
                insert_detail(&mut set, &shape, &event.locale, slug);
            }

            if published(event.previous_status)
                && let Some(previous) = event.previous_slug.as_deref()
                && (event.slug.as_deref() != Some(previous) || !event.status.is_published())
            {
                insert_detail(&mut set, &shape, &event.locale, previous);
            }
        }
        Operation::Delete => {
            // Whatever was last live stops being live.
            if event.status.is_published()
                && let Some(slug) = event.slug.as_deref()
            {
                insert_detail(&mut set, &shape, &event.locale, slug);
            }
            if published(event.previous_status)
                && let Some(previous) = event.previous_slug.as_deref()
            {
                insert_detail(&mut set, &shape, &event.locale, previous);
            }
        }
    }

    for locale in locales.locales() {
        for page in 1..=shape.lookahead.max(1) {
            if let Some(path) = shape.listing_path(locale, page) {
                set.insert_path(path, locale.clone());
            }
        }
    }
    set.insert_tag(shape.tag.clone());

    set
}

fn insert_detail(set: &mut PurgeSet, shape: &PathShape, locale: &Locale, slug: &str) {
    set.insert_path(shape.detail_path(locale, slug), locale.clone());
}

/// Merged targets of a drained batch of events.
#[derive(Debug, Default)]
pub struct ConsumptionPlan {
    pub targets: PurgeSet,
    /// Number of distinct events merged.
    pub events: usize,
    /// Events per lifecycle transition, for logging.
    pub transitions: BTreeMap<&'static str, usize>,
}

impl fmt::Display for ConsumptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConsumptionPlan {{ events: {}, targets: {}, transitions: {:?} }}",
            self.events, self.targets, self.transitions,
        )
    }
}

impl ConsumptionPlan {
    /// Merge events into one plan, skipping repeated event ids.
    ///
    /// Union is order independent, so the batch order does not matter.
    pub fn from_events(events: Vec<CacheEvent>) -> Self {
        let mut plan = Self::default();
        let mut seen_ids: HashSet<Uuid> = HashSet::new();

        for event in events.iter().filter(|event| seen_ids.insert(event.id)) {
            plan.events += 1;
            plan.targets.merge(&event.targets);
            *plan
                .transitions
                .entry(event.mutation.transition().as_str())
                .or_default() += 1;
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
