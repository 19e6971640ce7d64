//! Response cache middleware.
//!
//! Caches anonymous GET requests to public routes and serves them until a
//! purge or the max age removes them.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::{Body, HttpBody},
    extract::State,
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::counter;
use tracing::{debug, instrument, warn};

use crate::domain::locale::LocaleSet;

use super::{
    CacheConfig, CacheRegistry, ResponseStore, deps,
    keys::{CacheKey, PurgeTarget, StoreKey, hash_query},
    store::CachedResponse,
};

pub const METRIC_CACHE_HIT: &str = "vellum_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "vellum_cache_miss_total";

/// Session cookie of signed-in editors; their requests may see drafts.
pub const AUTH_COOKIE: &str = "payload-token";
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Shared cache state for middleware.
#[derive(Clone)]
pub struct CacheState {
    pub config: CacheConfig,
    pub locales: Arc<LocaleSet>,
    pub store: Arc<ResponseStore>,
    pub registry: Arc<CacheRegistry>,
}

impl CacheState {
    pub fn new(config: CacheConfig, locales: Arc<LocaleSet>) -> Self {
        let store = Arc::new(ResponseStore::new(&config));
        Self {
            config,
            locales,
            store,
            registry: Arc::new(CacheRegistry::new()),
        }
    }

    /// Drop expired entries and their registrations.
    pub fn sweep_expired(&self) -> usize {
        let expired = self.store.evict_expired();
        for key in &expired {
            self.registry.unregister(key);
        }
        if !expired.is_empty() {
            debug!(expired = expired.len(), "Expired cached responses swept");
        }
        expired.len()
    }

    fn store_key(&self, path: &str, query: &str) -> StoreKey {
        let locale = self.locales.resolve(path).locale.clone();
        StoreKey {
            key: CacheKey::new(path, locale),
            variant: hash_query(query),
        }
    }
}

/// Middleware for response caching.
///
/// Only caches GET requests without an editor session that return 200 OK.
/// Each entry is registered under its own path plus every target recorded
/// through [`deps::record`] while the handler ran.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.config.enabled
        || request.method() != Method::GET
        || has_auth_cookie(request.headers())
    {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or("").to_string();
    let store_key = cache.store_key(&path, &query);

    if let Some(cached) = cache.store.get(&store_key) {
        debug!(outcome = "hit", "Serving cached response");
        counter!(METRIC_CACHE_HIT).increment(1);
        return build_response(cached);
    }

    debug!(outcome = "miss", "Cache miss, executing handler");
    counter!(METRIC_CACHE_MISS).increment(1);

    let (response, deps) = deps::with_collector(next.run(request)).await;

    if response.status() != StatusCode::OK
        || exceeds_limit(&response, cache.config.response_body_limit_bytes)
    {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, cache.config.response_body_limit_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "Failed to buffer response body for caching");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let cached = CachedResponse::new(
        parts.status.as_u16(),
        parts
            .headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect(),
        bytes.clone(),
    );

    let mut targets: HashSet<PurgeTarget> = deps;
    targets.insert(PurgeTarget::Path(store_key.key.clone()));
    debug!(deps_count = targets.len(), "Caching response");

    if let Some(evicted) = cache.store.insert(store_key.clone(), cached) {
        cache.registry.unregister(&evicted);
    }
    cache.registry.register(store_key, targets);

    parts
        .headers
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static("miss"));
    Response::from_parts(parts, Body::from(bytes))
}

/// Whether the request carries an editor session cookie.
pub fn has_auth_cookie(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .any(|pair| {
            pair.trim()
                .split_once('=')
                .is_some_and(|(name, _)| name == AUTH_COOKIE)
        })
}

/// Declared or exactly known body length above `limit`; such responses are
/// passed through uncached.
fn exceeds_limit(response: &Response, limit: usize) -> bool {
    let declared = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    declared
        .or_else(|| response.body().size_hint().exact())
        .is_some_and(|length| length > limit as u64)
}

/// Build a response from cached data.
fn build_response(cached: CachedResponse) -> Response {
    let mut builder = Response::builder().status(cached.status);

    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .header(CACHE_STATUS_HEADER, "hit")
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Router, middleware, routing::get};
    use tower::ServiceExt;

    use crate::cache::keys::AggregateTag;

    use super::*;

    fn state(config: CacheConfig) -> CacheState {
        let locales = LocaleSet::new(["sl", "en"], "sl").expect("valid locales");
        CacheState::new(config, Arc::new(locales))
    }

    fn app(cache: CacheState, calls: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/{*path}",
                get(move || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        deps::record(PurgeTarget::Tag(AggregateTag::new("posts-sitemap")));
                        "rendered"
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(cache, response_cache_layer))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let cache = state(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app(cache.clone(), calls.clone());

        let first = app.clone().oneshot(get_request("/en/posts")).await.expect("response");
        assert_eq!(first.headers()[CACHE_STATUS_HEADER], "miss");
        let second = app.oneshot(get_request("/en/posts")).await.expect("response");
        assert_eq!(second.headers()[CACHE_STATUS_HEADER], "hit");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.store.len(), 1);
    }

    #[tokio::test]
    async fn entries_are_registered_under_path_and_recorded_deps() {
        let cache = state(CacheConfig::default());
        let app = app(cache.clone(), Arc::new(AtomicUsize::new(0)));
        app.oneshot(get_request("/en/posts?category=news"))
            .await
            .expect("response");

        let locale = cache.locales.get("en").expect("configured").clone();
        let by_path = cache
            .registry
            .keys_for(&PurgeTarget::Path(CacheKey::new("/en/posts", locale)));
        let by_tag = cache
            .registry
            .keys_for(&PurgeTarget::Tag(AggregateTag::new("posts-sitemap")));
        assert_eq!(by_path.len(), 1);
        assert_eq!(by_path, by_tag);
    }

    #[tokio::test]
    async fn editor_sessions_bypass_the_cache() {
        let cache = state(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app(cache.clone(), calls.clone());

        for _ in 0..2 {
            let request = Request::builder()
                .uri("/en/posts")
                .header(header::COOKIE, "theme=dark; payload-token=abc")
                .body(Body::empty())
                .expect("request builds");
            let response = app.clone().oneshot(request).await.expect("response");
            assert!(response.headers().get(CACHE_STATUS_HEADER).is_none());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.store.is_empty());
    }

    #[tokio::test]
    async fn disabled_cache_passes_through() {
        let cache = state(CacheConfig {
            enabled: false,
            ..Default::default()
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app(cache.clone(), calls.clone());

        app.clone().oneshot(get_request("/en")).await.expect("response");
        app.oneshot(get_request("/en")).await.expect("response");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn oversized_responses_are_not_cached() {
        let cache = state(CacheConfig {
            response_body_limit_bytes: 4,
            ..Default::default()
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app(cache.clone(), calls.clone());

        let response = app.oneshot(get_request("/en/posts")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CACHE_STATUS_HEADER).is_none());
        assert!(cache.store.is_empty());
    }

    #[test]
    fn sweep_removes_expired_entries_and_registrations() {
        let cache = state(CacheConfig {
            max_age_seconds: 0,
            ..Default::default()
        });
        let key = cache.store_key("/en", "");
        cache.store.insert(
            key.clone(),
            CachedResponse::new(200, vec![], bytes::Bytes::from_static(b"x")),
        );
        cache
            .registry
            .register(key.clone(), HashSet::from([PurgeTarget::Path(key.key.clone())]));

        assert_eq!(cache.sweep_expired(), 1);
        assert_eq!(cache.registry.key_count(), 0);
    }
}
