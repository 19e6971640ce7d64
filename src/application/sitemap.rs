//! Per-collection sitemaps.

use std::sync::Arc;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

use crate::application::content::ContentStore;
use crate::application::error::AppError;
use crate::application::site::published_documents;
use crate::cache::paths::PathShapeTable;
use crate::cache::{PurgeTarget, deps};
use crate::domain::document::CollectionName;
use crate::domain::locale::LocaleSet;

/// Service for generating `/{collection}-sitemap.xml`.
#[derive(Clone)]
pub struct SitemapService {
    store: Arc<dyn ContentStore>,
    table: Arc<PathShapeTable>,
    locales: Arc<LocaleSet>,
    public_url: Url,
}

impl SitemapService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        table: Arc<PathShapeTable>,
        locales: Arc<LocaleSet>,
        public_url: Url,
    ) -> Self {
        Self {
            store,
            table,
            locales,
            public_url,
        }
    }

    /// Every published detail path of `collection` in every locale.
    ///
    /// Records the collection's aggregate tag as a cache dependency.
    pub async fn sitemap_xml(&self, collection: &CollectionName) -> Result<String, AppError> {
        let shape = self.table.get(collection).ok_or(AppError::NotFound)?;
        deps::record(PurgeTarget::Tag(shape.tag.clone()));

        let mut entries = Vec::new();
        for locale in self.locales.locales() {
            let documents = published_documents(self.store.as_ref(), collection, locale).await?;
            for document in documents {
                let Some(slug) = document.slug_for(locale) else {
                    continue;
                };
                let path = shape.detail_path(locale, slug);
                let lastmod = document
                    .published_at
                    .as_deref()
                    .and_then(|value| OffsetDateTime::parse(value, &Rfc3339).ok());
                entries.push(sitemap_entry(&self.public_url, &path, lastmod));
            }
        }

        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );
        for entry in entries {
            xml.push_str(&entry);
        }
        xml.push_str("</urlset>\n");
        Ok(xml)
    }
}

fn sitemap_entry(base: &Url, path: &str, lastmod: Option<OffsetDateTime>) -> String {
    let loc = escape_xml(&canonical_url(base, path));
    let lastmod_str = lastmod
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_default();
    if lastmod_str.is_empty() {
        format!("  <url><loc>{loc}</loc></url>\n")
    } else {
        format!("  <url><loc>{loc}</loc><lastmod>{lastmod_str}</lastmod></url>\n")
    }
}

fn canonical_url(base: &Url, path: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    format!("{base}{path}")
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
