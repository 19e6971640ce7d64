//! Content store contract.
//!
//! The service only reads from the store. Adapters live in
//! `infra::content`.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::document::{CollectionName, Document, DocumentId, DocumentStatus};
use crate::domain::locale::Locale;

/// Default listing sort: newest first.
pub const NEWEST_FIRST: &str = "-publishedAt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("content store request failed: {0}")]
    Transport(String),
    #[error("content store answered {status} for `{resource}`")]
    Status { resource: String, status: u16 },
    #[error("content store returned an unreadable response: {0}")]
    Decode(String),
    #[error("content store is misconfigured: {0}")]
    Configuration(String),
}

impl StoreError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Conditions a document must meet; all set fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub slug: Option<String>,
    pub status: Option<DocumentStatus>,
    /// Document lists this id among its categories.
    pub category: Option<DocumentId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindQuery {
    pub collection: CollectionName,
    pub locale: Locale,
    /// Include unpublished versions.
    pub draft: bool,
    pub filter: Filter,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
    pub sort: Option<String>,
}

impl FindQuery {
    pub fn new(collection: impl Into<CollectionName>, locale: Locale) -> Self {
        Self {
            collection: collection.into(),
            locale,
            draft: false,
            filter: Filter::default(),
            page: 1,
            page_size: 10,
            sort: None,
        }
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.filter.slug = Some(slug.into());
        self
    }

    /// Only documents whose live version is published.
    pub fn published(mut self) -> Self {
        self.filter.status = Some(DocumentStatus::Published);
        self
    }

    pub fn category(mut self, id: DocumentId) -> Self {
        self.filter.category = Some(id);
        self
    }

    pub fn draft(mut self, draft: bool) -> Self {
        self.draft = draft;
        self
    }

    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page.max(1);
        self.page_size = page_size.max(1);
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

/// One page of results, shaped like the store's paginated response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPage {
    pub docs: Vec<Document>,
    pub total_docs: u64,
    pub page: u32,
    pub total_pages: u32,
    pub limit: u32,
}

impl DocumentPage {
    pub fn empty(limit: u32) -> Self {
        Self {
            docs: Vec::new(),
            total_docs: 0,
            page: 1,
            total_pages: 1,
            limit,
        }
    }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn find(&self, query: &FindQuery) -> Result<DocumentPage, StoreError>;

    async fn find_by_id(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        locale: &Locale,
    ) -> Result<Option<Document>, StoreError>;

    /// The published document with `slug` in `locale`, if any.
    async fn find_published_by_slug(
        &self,
        collection: &CollectionName,
        locale: &Locale,
        slug: &str,
    ) -> Result<Option<Document>, StoreError> {
        let query = FindQuery::new(collection.clone(), locale.clone())
            .slug(slug)
            .published()
            .page(1, 1);
        Ok(self.find(&query).await?.docs.into_iter().next())
    }
}

/// Walk every page of `query` and return all matching documents.
pub async fn find_all(
    store: &dyn ContentStore,
    query: FindQuery,
) -> Result<Vec<Document>, StoreError> {
    let mut query = query;
    let mut documents = Vec::new();
    loop {
        let page = store.find(&query).await?;
        let last = page.docs.is_empty() || page.page >= page.total_pages;
        documents.extend(page.docs);
        if last {
            return Ok(documents);
        }
        query.page = page.page + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_builder_clamps_paging() {
        let query = FindQuery::new("posts", Locale::parse("en").expect("valid locale"))
            .published()
            .slug("hello")
            .page(0, 0)
            .sort(NEWEST_FIRST);

        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 1);
        assert_eq!(query.filter.status, Some(DocumentStatus::Published));
        assert_eq!(query.filter.slug.as_deref(), Some("hello"));
        assert_eq!(query.sort.as_deref(), Some("-publishedAt"));
        assert!(!query.draft);
    }

    #[test]
    fn page_decodes_store_response() {
        let page: DocumentPage = serde_json::from_str(
            r#"{"docs":[{"id":1,"slug":"a","title":"A"}],"totalDocs":1,"page":1,
                "totalPages":1,"limit":6,"hasNextPage":false}"#,
        )
        .expect("page decodes");
        assert_eq!(page.docs.len(), 1);
        assert_eq!(page.total_pages, 1);
    }
}
