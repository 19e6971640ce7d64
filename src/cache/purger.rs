//! Purge sinks.
//!
//! A [`Purger`] executes a purge set somewhere: in this process's response
//! cache, or at a downstream revalidation endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

use super::keys::PurgeSet;
use super::registry::CacheRegistry;
use super::store::ResponseStore;

pub const PURGE_SECRET_HEADER: &str = "x-vellum-purge-secret";

#[derive(Debug, Error)]
pub enum PurgeError {
    #[error("purge request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("purge endpoint {endpoint} answered {status}")]
    Status { endpoint: String, status: u16 },
}

#[async_trait]
pub trait Purger: Send + Sync {
    /// Label used in logs and metrics.
    fn name(&self) -> &str;

    /// Execute `targets`; returns how many entries or targets were purged.
    async fn purge(&self, targets: &PurgeSet) -> Result<usize, PurgeError>;
}

/// Removes matching entries from the in-process response cache.
pub struct LocalPurger {
    store: Arc<ResponseStore>,
    registry: Arc<CacheRegistry>,
}

impl LocalPurger {
    pub fn new(store: Arc<ResponseStore>, registry: Arc<CacheRegistry>) -> Self {
        Self { store, registry }
    }
}

#[async_trait]
impl Purger for LocalPurger {
    fn name(&self) -> &str {
        "local"
    }

    async fn purge(&self, targets: &PurgeSet) -> Result<usize, PurgeError> {
        let mut removed = 0;
        for target in targets {
            for key in self.registry.keys_for(target) {
                if self.store.invalidate(&key) {
                    removed += 1;
                }
                self.registry.unregister(&key);
            }
        }
        debug!(targets = targets.len(), removed, "Local response cache purged");
        Ok(removed)
    }
}

/// POSTs the purge set as `{paths, tags}` JSON to a revalidation endpoint.
pub struct WebhookPurger {
    client: Client,
    endpoint: Url,
    secret: Option<String>,
}

impl WebhookPurger {
    pub fn new(
        endpoint: Url,
        secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("vellum/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            secret,
        })
    }
}

#[async_trait]
impl Purger for WebhookPurger {
    fn name(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn purge(&self, targets: &PurgeSet) -> Result<usize, PurgeError> {
        if targets.is_empty() {
            return Ok(0);
        }

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&targets.to_report());
        if let Some(secret) = &self.secret {
            request = request.header(PURGE_SECRET_HEADER, secret);
        }

        let response = request.send().await.map_err(|source| PurgeError::Transport {
            endpoint: self.endpoint.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PurgeError::Status {
                endpoint: self.endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(targets.len())
    }
}
