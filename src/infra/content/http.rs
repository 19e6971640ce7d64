use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::application::content::{ContentStore, DocumentPage, FindQuery, StoreError};
use crate::domain::document::{CollectionName, Document, DocumentId};
use crate::domain::locale::Locale;

/// Reads documents from the CMS REST API (`/api/{collection}`).
pub struct HttpContentStore {
    client: Client,
    base: Url,
    authorization: Option<String>,
    depth: u32,
}

impl HttpContentStore {
    pub fn new(
        base_url: Url,
        api_key: Option<(&str, &str)>,
        timeout: Duration,
        depth: u32,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("vellum/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|err| StoreError::Configuration(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Configuration(format!(
                "`{base_url}` cannot be a base"
            )));
        }
        let authorization =
            api_key.map(|(collection, key)| format!("{collection} API-Key {key}"));

        Ok(Self {
            client,
            base: base_url,
            authorization,
            depth,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Configuration(format!("`{}` cannot be a base", self.base)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, mut url: Url, query: &[(String, String)]) -> Result<Response, StoreError> {
        url.set_query(None);
        url.query_pairs_mut().extend_pairs(query);
        let mut request = self.client.get(url);
        if let Some(authorization) = &self.authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        request.send().await.map_err(StoreError::transport)
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        resource: &str,
    ) -> Result<T, StoreError> {
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                resource: resource.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(StoreError::transport)?;
        serde_json::from_slice(&bytes).map_err(StoreError::decode)
    }
}

/// Query-string pairs for a find request, in the store's bracket syntax.
pub fn find_params(query: &FindQuery, depth: u32) -> Vec<(String, String)> {
    let mut params = vec![
        ("locale".to_string(), query.locale.to_string()),
        ("depth".to_string(), depth.to_string()),
        ("page".to_string(), query.page.to_string()),
        ("limit".to_string(), query.page_size.to_string()),
    ];
    if query.draft {
        params.push(("draft".to_string(), "true".to_string()));
    }
    if let Some(sort) = &query.sort {
        params.push(("sort".to_string(), sort.clone()));
    }
    if let Some(slug) = &query.filter.slug {
        params.push(("where[slug][equals]".to_string(), slug.clone()));
    }
    if let Some(status) = query.filter.status {
        params.push(("where[_status][equals]".to_string(), status.as_str().to_string()));
    }
    if let Some(category) = &query.filter.category {
        params.push(("where[categories][in]".to_string(), category.to_string()));
    }
    params
}

#[async_trait]
impl ContentStore for HttpContentStore {
    #[instrument(
        skip_all,
        fields(collection = %query.collection, locale = %query.locale, page = query.page)
    )]
    async fn find(&self, query: &FindQuery) -> Result<DocumentPage, StoreError> {
        let url = self.url(&[query.collection.as_str()])?;
        let response = self.get(url, &find_params(query, self.depth)).await?;
        let page: DocumentPage = Self::decode(response, query.collection.as_str()).await?;
        debug!(docs = page.docs.len(), total = page.total_docs, "content store page");
        Ok(page)
    }

    #[instrument(skip_all, fields(collection = %collection, id = %id, locale = %locale))]
    async fn find_by_id(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        locale: &Locale,
    ) -> Result<Option<Document>, StoreError> {
        let id = id.to_string();
        let url = self.url(&[collection.as_str(), id.as_str()])?;
        let params = [
            ("locale".to_string(), locale.to_string()),
            ("depth".to_string(), self.depth.to_string()),
        ];
        let response = self.get(url, &params).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resource = format!("{collection}/{id}");
        Self::decode(response, &resource).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::content::NEWEST_FIRST;

    fn locale(code: &str) -> Locale {
        Locale::parse(code).expect("valid locale")
    }

    #[test]
    fn find_params_carry_filters() {
        let query = FindQuery::new("posts", locale("en"))
            .published()
            .category(DocumentId::Number(3))
            .page(2, 6)
            .sort(NEWEST_FIRST);

        let params = find_params(&query, 1);
        let rendered: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        assert_eq!(
            rendered,
            vec![
                "locale=en",
                "depth=1",
                "page=2",
                "limit=6",
                "sort=-publishedAt",
                "where[_status][equals]=published",
                "where[categories][in]=3",
            ]
        );
    }

    #[test]
    fn draft_queries_request_drafts() {
        let query = FindQuery::new("pages", locale("sl")).slug("domov").draft(true);
        let params = find_params(&query, 2);
        assert!(params.contains(&("draft".to_string(), "true".to_string())));
        assert!(params.contains(&("where[slug][equals]".to_string(), "domov".to_string())));
        assert!(!params.iter().any(|(key, _)| key.starts_with("where[_status]")));
    }

    #[test]
    fn urls_keep_base_path() {
        let store = HttpContentStore::new(
            Url::parse("http://cms.internal:3000/cms/").expect("url"),
            Some(("users", "k")),
            Duration::from_secs(1),
            2,
        )
        .expect("store builds");
        let url = store.url(&["posts", "42"]).expect("url");
        assert_eq!(url.as_str(), "http://cms.internal:3000/cms/api/posts/42");
        assert_eq!(store.authorization.as_deref(), Some("users API-Key k"));
    }
}
