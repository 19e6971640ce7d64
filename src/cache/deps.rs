//! Dependency collector for response cache invalidation.
//!
//! Handlers record the purge targets their output depends on (for example a
//! sitemap records its aggregate tag). The cache layer collects them when
//! the request finishes and registers the stored response under each one.

use std::cell::RefCell;
use std::collections::HashSet;
use std::future::Future;

use super::keys::PurgeTarget;

tokio::task_local! {
    static DEPS: RefCell<HashSet<PurgeTarget>>;
}

/// Record a dependency of the response being built.
///
/// Ignored when no collector is active.
pub fn record(target: PurgeTarget) {
    let _ = DEPS.try_with(|deps| {
        deps.borrow_mut().insert(target);
    });
}

/// Snapshot of the dependencies recorded so far in the current scope.
pub fn collect() -> HashSet<PurgeTarget> {
    DEPS.try_with(|deps| deps.borrow().clone())
        .unwrap_or_default()
}

/// Run `f` with a fresh collector and return its output with everything
/// recorded while it ran.
pub async fn with_collector<F, R>(f: F) -> (R, HashSet<PurgeTarget>)
where
    F: Future<Output = R>,
{
    DEPS.scope(RefCell::new(HashSet::new()), async move {
        let result = f.await;
        (result, collect())
    })
    .await
}
