//! Response cache storage.
//!
//! An LRU of rendered responses. Entries older than the configured max age
//! are treated as missing, which bounds staleness when a purge never
//! arrives.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;

use super::config::CacheConfig;
use super::keys::StoreKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Cached HTTP response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub stored_at: Instant,
}

impl CachedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            stored_at: Instant::now(),
        }
    }

    fn is_expired(&self, max_age: Duration) -> bool {
        self.stored_at.elapsed() >= max_age
    }
}

pub struct ResponseStore {
    responses: RwLock<LruCache<StoreKey, CachedResponse>>,
    max_age: Duration,
}

impl ResponseStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_limits(config.response_limit_non_zero(), config.max_age())
    }

    pub fn with_limits(limit: std::num::NonZeroUsize, max_age: Duration) -> Self {
        Self {
            responses: RwLock::new(LruCache::new(limit)),
            max_age,
        }
    }

    /// Fresh entry for `key`; an expired entry is dropped and reported missing.
    pub fn get(&self, key: &StoreKey) -> Option<CachedResponse> {
        let mut responses = rw_write(&self.responses, SOURCE, "get");
        let expired = responses.peek(key)?.is_expired(self.max_age);
        if expired {
            responses.pop(key);
            return None;
        }
        responses.get(key).cloned()
    }

    /// Store a response; returns a different key evicted to make room.
    pub fn insert(&self, key: StoreKey, response: CachedResponse) -> Option<StoreKey> {
        rw_write(&self.responses, SOURCE, "insert")
            .push(key.clone(), response)
            .map(|(evicted, _)| evicted)
            .filter(|evicted| *evicted != key)
    }

    pub fn invalidate(&self, key: &StoreKey) -> bool {
        rw_write(&self.responses, SOURCE, "invalidate")
            .pop(key)
            .is_some()
    }

    /// Remove every expired entry and return their keys.
    pub fn evict_expired(&self) -> Vec<StoreKey> {
        let mut responses = rw_write(&self.responses, SOURCE, "evict_expired");
        let expired: Vec<StoreKey> = responses
            .iter()
            .filter(|(_, response)| response.is_expired(self.max_age))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            responses.pop(key);
        }
        expired
    }

    pub fn clear(&self) {
        rw_write(&self.responses, SOURCE, "clear").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.responses, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
