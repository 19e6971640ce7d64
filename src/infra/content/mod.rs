//! Content store adapters.

mod http;
mod memory;

use std::sync::Arc;

pub use http::{HttpContentStore, find_params};
pub use memory::MemoryContentStore;

use crate::application::content::ContentStore;
use crate::config::{ContentBackend, ContentSettings};

use super::error::InfraError;

/// Build the store the configuration selects.
pub async fn connect(settings: &ContentSettings) -> Result<Arc<dyn ContentStore>, InfraError> {
    match &settings.backend {
        ContentBackend::Http {
            base_url,
            api_key,
            api_key_collection,
        } => {
            let store = HttpContentStore::new(
                base_url.clone(),
                api_key
                    .as_deref()
                    .map(|key| (api_key_collection.as_str(), key)),
                settings.timeout,
                settings.depth,
            )?;
            Ok(Arc::new(store))
        }
        ContentBackend::Memory { fixtures } => {
            Ok(Arc::new(MemoryContentStore::load(fixtures).await?))
        }
    }
}
