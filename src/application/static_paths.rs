//! Enumeration of every statically known public path.

use std::collections::BTreeSet;

use crate::application::content::{ContentStore, FindQuery};
use crate::application::error::AppError;
use crate::application::site::published_documents;
use crate::cache::paths::PathShapeTable;
use crate::domain::locale::LocaleSet;

/// Home pages, every published detail page and every listing page, in
/// every locale. Sorted and free of duplicates.
pub async fn static_paths(
    store: &dyn ContentStore,
    table: &PathShapeTable,
    locales: &LocaleSet,
) -> Result<Vec<String>, AppError> {
    let mut paths = BTreeSet::new();

    for locale in locales.locales() {
        paths.insert(format!("/{locale}"));

        for shape in table.shapes() {
            let documents = published_documents(store, &shape.collection, locale).await?;
            for document in &documents {
                let Some(slug) = document.slug_for(locale) else {
                    continue;
                };
                if shape.home_slug.as_deref() == Some(slug) {
                    continue;
                }
                paths.insert(shape.detail_path(locale, slug));
            }

            if shape.has_listing() {
                let query = FindQuery::new(shape.collection.clone(), locale.clone())
                    .published()
                    .page(1, 1);
                let total_docs = store.find(&query).await?.total_docs;
                let per_page = u64::from(shape.per_page.max(1));
                let total_pages = u32::try_from(total_docs.div_ceil(per_page).max(1))
                    .unwrap_or(u32::MAX);
                for page in 1..=total_pages {
                    paths.extend(shape.listing_path(locale, page));
                }
            }
        }
    }

    Ok(paths.into_iter().collect())
}
