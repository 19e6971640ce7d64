//! Request and response bodies for the `POST /hooks/mutation` endpoint.
//!
//! Content stores send a [`MutationPayload`] after every change hook; vellum
//! answers with the [`PurgeReport`] it executed.

use serde::{Deserialize, Serialize};

/// Identifier of a document as the content store reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentKey {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationOperation {
    #[default]
    Change,
    Delete,
}

/// A document lifecycle change.
///
/// For deletes, `slug` and `status` carry the last known state of the
/// removed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationPayload {
    pub collection: String,
    pub id: DocumentKey,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub previous_slug: Option<String>,
    pub status: PublicationStatus,
    #[serde(default)]
    pub previous_status: Option<PublicationStatus>,
    #[serde(default)]
    pub operation: MutationOperation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgedPath {
    pub path: String,
    pub locale: String,
}

/// Targets purged for one mutation, in deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    pub paths: Vec<PurgedPath>,
    pub tags: Vec<String>,
}

impl PurgeReport {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.tags.is_empty()
    }
}
