//! Vellum cache system.
//!
//! Two halves share one vocabulary of [`PurgeTarget`]s:
//!
//! - **Invalidation**: a mutation event is planned into a [`PurgeSet`]
//!   (detail paths, listing pages in every locale, aggregate tags), queued,
//!   and executed by every configured [`Purger`].
//! - **Response cache**: rendered public responses are stored per path,
//!   locale and query, and registered under the targets that can make them
//!   stale.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! response_limit = 500
//! max_age_seconds = 600
//! # ... see config.rs for all options
//! ```

mod config;
mod consumer;
mod coordinator;
pub mod deps;
mod events;
mod keys;
mod lock;
mod middleware;
pub mod paths;
mod planner;
mod purger;
mod registry;
mod store;

pub use config::CacheConfig;
pub use consumer::{CacheConsumer, PurgeOutcome};
pub use coordinator::InvalidationCoordinator;
pub use events::{CacheEvent, Epoch, EventQueue};
pub use keys::{AggregateTag, CacheKey, PurgeSet, PurgeTarget, StoreKey, hash_query, hash_value};
pub use middleware::{
    AUTH_COOKIE, CACHE_STATUS_HEADER, CacheState, has_auth_cookie, response_cache_layer,
};
pub use paths::{PathShape, PathShapeSpec, PathShapeTable, PathTemplate, PathTemplateError};
pub use planner::{ConsumptionPlan, plan_mutation};
pub use purger::{LocalPurger, PURGE_SECRET_HEADER, PurgeError, Purger, WebhookPurger};
pub use registry::CacheRegistry;
pub use store::{CachedResponse, ResponseStore};

/// Names of every metric the cache emits.
pub mod metric_names {
    pub use super::consumer::{METRIC_CACHE_CONSUME_MS, METRIC_CACHE_PURGE_FAILED};
    pub use super::events::METRIC_EVENT_QUEUE_LEN;
    pub use super::middleware::{METRIC_CACHE_HIT, METRIC_CACHE_MISS};
}
