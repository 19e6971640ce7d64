use std::{cmp::Ordering, collections::BTreeMap, path::Path};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::application::content::{ContentStore, DocumentPage, FindQuery, StoreError};
use crate::domain::document::{CollectionName, Document, DocumentId, DocumentStatus};
use crate::domain::locale::Locale;

/// Per-locale field overrides inside a fixture document.
const LOCALE_OVERRIDES: &str = "_locales";

/// Serves documents from a JSON fixture of the form
/// `{"pages": [doc, ...], "posts": [...]}`.
///
/// A document may carry `"_locales": {"en": {...}}`; those fields replace
/// the top-level ones when queried in that locale.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    collections: BTreeMap<CollectionName, Vec<Map<String, Value>>>,
}

struct Localized {
    raw: Map<String, Value>,
    document: Document,
}

impl MemoryContentStore {
    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        let Value::Object(root) = value else {
            return Err(StoreError::decode("fixture root must be an object"));
        };

        let mut collections = BTreeMap::new();
        for (name, docs) in root {
            let Value::Array(docs) = docs else {
                return Err(StoreError::decode(format!(
                    "collection `{name}` must be an array"
                )));
            };
            let docs = docs
                .into_iter()
                .map(|doc| match doc {
                    Value::Object(fields) => {
                        serde_json::from_value::<Document>(Value::Object(fields.clone()))
                            .map_err(|err| StoreError::decode(format!("{name}: {err}")))?;
                        Ok(fields)
                    }
                    _ => Err(StoreError::decode(format!(
                        "collection `{name}` holds a non-object document"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            collections.insert(CollectionName::new(name), docs);
        }

        Ok(Self { collections })
    }

    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            StoreError::Configuration(format!("failed to read {}: {err}", path.display()))
        })?;
        let value: Value = serde_json::from_slice(&bytes).map_err(StoreError::decode)?;
        let store = Self::from_value(value)?;
        info!(
            path = %path.display(),
            collections = store.collections.len(),
            "loaded content fixtures"
        );
        Ok(store)
    }

    fn localized(
        &self,
        collection: &CollectionName,
        locale: &Locale,
    ) -> Result<Vec<Localized>, StoreError> {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|fields| {
                let raw = localize_fields(fields, locale);
                let document = serde_json::from_value(Value::Object(raw.clone()))
                    .map_err(StoreError::decode)?;
                Ok(Localized { raw, document })
            })
            .collect()
    }
}

fn localize_fields(fields: &Map<String, Value>, locale: &Locale) -> Map<String, Value> {
    let mut raw = fields.clone();
    let overrides = raw.remove(LOCALE_OVERRIDES);
    if let Some(Value::Object(overrides)) = overrides
        && let Some(Value::Object(localized)) = overrides.get(locale.as_str())
    {
        raw.extend(localized.clone());
    }
    raw
}

fn matches(query: &FindQuery, document: &Document) -> bool {
    if !query.draft && document.status == DocumentStatus::Draft {
        return false;
    }
    if let Some(status) = query.filter.status
        && document.status != status
    {
        return false;
    }
    if let Some(slug) = &query.filter.slug
        && document.slug_for(&query.locale) != Some(slug.as_str())
    {
        return false;
    }
    if let Some(category) = &query.filter.category
        && !document
            .categories
            .iter()
            .any(|value| value.id() == category)
    {
        return false;
    }
    true
}

/// Orders by a top-level field; a leading `-` sorts descending. Missing
/// values sort last either way.
fn compare(sort: &str, a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
    let (field, descending) = match sort.strip_prefix('-') {
        Some(field) => (field, true),
        None => (sort, false),
    };
    match (a.get(field), b.get(field)) {
        (Some(a), Some(b)) if !a.is_null() && !b.is_null() => {
            let ordering = compare_values(a, b);
            if descending { ordering.reverse() } else { ordering }
        }
        (Some(a), _) if !a.is_null() => Ordering::Less,
        (_, Some(b)) if !b.is_null() => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    #[instrument(
        skip_all,
        fields(collection = %query.collection, locale = %query.locale, page = query.page)
    )]
    async fn find(&self, query: &FindQuery) -> Result<DocumentPage, StoreError> {
        let mut matching: Vec<Localized> = self
            .localized(&query.collection, &query.locale)?
            .into_iter()
            .filter(|entry| matches(query, &entry.document))
            .collect();

        if let Some(sort) = query.sort.as_deref() {
            matching.sort_by(|a, b| compare(sort, &a.raw, &b.raw));
        }

        let limit = query.page_size.max(1);
        let total_docs = matching.len() as u64;
        let total_pages = u32::try_from(total_docs.div_ceil(u64::from(limit)).max(1))
            .unwrap_or(u32::MAX);
        let skip = (query.page.max(1) as usize - 1).saturating_mul(limit as usize);
        let docs = matching
            .into_iter()
            .skip(skip)
            .take(limit as usize)
            .map(|entry| entry.document)
            .collect();

        Ok(DocumentPage {
            docs,
            total_docs,
            page: query.page.max(1),
            total_pages,
            limit,
        })
    }

    async fn find_by_id(
        &self,
        collection: &CollectionName,
        id: &DocumentId,
        locale: &Locale,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .localized(collection, locale)?
            .into_iter()
            .map(|entry| entry.document)
            .find(|document| &document.id == id))
    }
}
