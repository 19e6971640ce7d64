//! Cache configuration.
//!
//! Controls the response cache and the invalidation consumer via
//! `vellum.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_RESPONSE_LIMIT: usize = 500;
const DEFAULT_RESPONSE_BODY_LIMIT_BYTES: usize = 1024 * 1024;
const DEFAULT_MAX_AGE_SECONDS: u64 = 600;
const DEFAULT_AUTO_CONSUME_INTERVAL_MS: u64 = 5000;
const DEFAULT_CONSUME_BATCH_LIMIT: usize = 100;
const DEFAULT_LOOKAHEAD: u32 = 5;

/// Cache configuration from the `[cache]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve and store rendered responses.
    pub enabled: bool,
    /// Maximum cached responses before LRU eviction.
    pub response_limit: usize,
    /// Responses with larger bodies are passed through uncached.
    pub response_body_limit_bytes: usize,
    /// Age after which a cached response counts as missing, even if no
    /// invalidation reached it.
    pub max_age_seconds: u64,
    /// Interval (ms) of the background consume and expiry sweep.
    pub auto_consume_interval_ms: u64,
    /// Maximum events per consumption batch.
    pub consume_batch_limit: usize,
    /// Listing pages purged per locale for collections that do not set
    /// their own window.
    pub default_lookahead: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            response_limit: DEFAULT_RESPONSE_LIMIT,
            response_body_limit_bytes: DEFAULT_RESPONSE_BODY_LIMIT_BYTES,
            max_age_seconds: DEFAULT_MAX_AGE_SECONDS,
            auto_consume_interval_ms: DEFAULT_AUTO_CONSUME_INTERVAL_MS,
            consume_batch_limit: DEFAULT_CONSUME_BATCH_LIMIT,
            default_lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}

impl CacheConfig {
    /// Returns the response limit as NonZeroUsize, clamping to 1 if zero.
    pub fn response_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.response_limit).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }

    pub fn auto_consume_interval(&self) -> Duration {
        Duration::from_millis(self.auto_consume_interval_ms.max(1))
    }
}
