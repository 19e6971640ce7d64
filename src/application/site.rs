//! Public site views: pages, collection details and listings.
//!
//! Each view fetches published content from the [`ContentStore`], renders it
//! through the block and hero registries, and records the cache targets its
//! output depends on.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::content::{ContentStore, FindQuery, NEWEST_FIRST, find_all};
use crate::application::error::AppError;
use crate::application::pagination::{PageRange, Pagination};
use crate::application::render::{
    BlockRegistry, HeroRegistry, RenderContext, RenderNode, RenderTree, render, render_rich_text,
};
use crate::application::routes::Route;
use crate::cache::deps;
use crate::cache::paths::{PathShape, PathShapeTable};
use crate::cache::{CacheKey, PurgeTarget};
use crate::domain::blocks::PageLayout;
use crate::domain::document::{CollectionName, Document, MediaRef, PRIMARY_COLLECTION};
use crate::domain::hero::{Hero, PostHero};
use crate::domain::locale::{Locale, LocaleSet};

const CATEGORY_LIMIT: u32 = 200;
const FALLBACK_HOME_SLUG: &str = "home";

/// Who is asking and how the listing is filtered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewRequest {
    pub authenticated: bool,
    /// Category slug from `?category=`.
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum SiteView {
    Page(PageView),
    Detail(PageView),
    Listing(ListingView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaView {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub collection: CollectionName,
    pub slug: String,
    pub title: Option<String>,
    pub meta: MetaView,
    pub tree: RenderTree,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingCard {
    pub title: Option<String>,
    pub description: Option<String>,
    pub href: Option<String>,
    pub image: Option<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryLink {
    pub slug: String,
    pub title: String,
    pub href: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    pub collection: CollectionName,
    pub locale: Locale,
    pub page: u32,
    pub total_pages: u32,
    pub cards: Vec<ListingCard>,
    pub categories: Vec<CategoryLink>,
    pub active_category: Option<String>,
    pub range: Option<PageRange>,
    /// Present when there is more than one page.
    pub pagination: Option<Pagination>,
}

#[derive(Clone)]
pub struct SiteService {
    store: Arc<dyn ContentStore>,
    table: Arc<PathShapeTable>,
    locales: Arc<LocaleSet>,
    blocks: Arc<BlockRegistry>,
    heroes: Arc<HeroRegistry>,
}

impl SiteService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        table: Arc<PathShapeTable>,
        locales: Arc<LocaleSet>,
        blocks: Arc<BlockRegistry>,
        heroes: Arc<HeroRegistry>,
    ) -> Self {
        Self {
            store,
            table,
            locales,
            blocks,
            heroes,
        }
    }

    pub fn locales(&self) -> &LocaleSet {
        &self.locales
    }

    pub fn table(&self) -> &PathShapeTable {
        &self.table
    }

    /// Serve a parsed route. Sitemaps are served by the sitemap service.
    pub async fn view(&self, route: &Route, request: &ViewRequest) -> Result<SiteView, AppError> {
        match route {
            Route::Home { locale } => self
                .home(locale, request.authenticated)
                .await
                .map(SiteView::Page),
            Route::Detail {
                collection,
                locale,
                slug,
            } if collection.is_primary() => self
                .page(locale, slug, request.authenticated)
                .await
                .map(SiteView::Page),
            Route::Detail {
                collection,
                locale,
                slug,
            } => self
                .detail(collection, locale, slug, request.authenticated)
                .await
                .map(SiteView::Detail),
            Route::Listing {
                collection,
                locale,
                page,
            } => self
                .listing(collection, locale, *page, request.category.as_deref())
                .await
                .map(SiteView::Listing),
            Route::Sitemap { .. } | Route::NotFound => Err(AppError::NotFound),
        }
    }

    pub async fn home(&self, locale: &Locale, authenticated: bool) -> Result<PageView, AppError> {
        let primary = CollectionName::new(PRIMARY_COLLECTION);
        let shape = self.table.shape_for(&primary);
        let slug = shape
            .home_slug
            .clone()
            .unwrap_or_else(|| FALLBACK_HOME_SLUG.to_string());
        self.page(locale, &slug, authenticated).await
    }

    /// A document of the primary collection rendered from its hero and layout.
    #[instrument(skip_all, fields(locale = %locale, slug = %slug))]
    pub async fn page(
        &self,
        locale: &Locale,
        slug: &str,
        authenticated: bool,
    ) -> Result<PageView, AppError> {
        let collection = CollectionName::new(PRIMARY_COLLECTION);
        let document = self
            .fetch(&collection, locale, slug, authenticated)
            .await?;
        let shape = self.table.shape_for(&collection);
        record_detail(&shape, locale, slug);

        let layout = PageLayout {
            hero: document.hero.clone(),
            blocks: document.layout.clone(),
        };
        let tree = render(&layout, &self.context(locale, authenticated));
        Ok(page_view(collection, slug, &document, tree))
    }

    /// A document of any other collection: post hero, rich-text body, then
    /// any layout blocks.
    #[instrument(skip_all, fields(collection = %collection, locale = %locale, slug = %slug))]
    pub async fn detail(
        &self,
        collection: &CollectionName,
        locale: &Locale,
        slug: &str,
        authenticated: bool,
    ) -> Result<PageView, AppError> {
        let document = self.fetch(collection, locale, slug, authenticated).await?;
        let shape = self.table.shape_for(collection);
        record_detail(&shape, locale, slug);

        let ctx = self.context(locale, authenticated);
        let hero = match &document.hero {
            Some(hero) if !matches!(hero, Hero::None) => hero.clone(),
            _ => Hero::Post(post_hero(&document)),
        };
        let mut tree = render(
            &PageLayout {
                hero: Some(hero),
                blocks: Vec::new(),
            },
            &ctx,
        );
        tree.nodes.extend(
            document
                .content
                .as_ref()
                .and_then(|content| render_rich_text(content, &ctx))
                .map(|body| RenderNode::element("body").child(body)),
        );
        tree.nodes.extend(ctx.render_blocks(&document.layout));

        Ok(page_view(collection.clone(), slug, &document, tree))
    }

    /// One page of a collection listing, newest first.
    #[instrument(skip_all, fields(collection = %collection, locale = %locale, page = page))]
    pub async fn listing(
        &self,
        collection: &CollectionName,
        locale: &Locale,
        page: u32,
        category: Option<&str>,
    ) -> Result<ListingView, AppError> {
        let shape = self.table.shape_for(collection);
        if !shape.has_listing() || page == 0 {
            return Err(AppError::NotFound);
        }

        let category = category.map(str::trim).filter(|slug| !slug.is_empty());
        let categories = self.categories(&shape, locale, category).await?;
        let category_id = match (category, &shape.category_collection) {
            (Some(slug), Some(category_collection)) => self
                .store
                .find_published_by_slug(category_collection, locale, slug)
                .await?
                .map(|document| document.id),
            _ => None,
        };
        let filtered = category_id.is_some();
        if category.is_some() && !filtered {
            debug!(category = ?category, "Unknown category; listing unfiltered");
        }

        let mut query = FindQuery::new(collection.clone(), locale.clone())
            .published()
            .page(page, shape.per_page)
            .sort(NEWEST_FIRST);
        if let Some(id) = category_id {
            query = query.category(id);
        }
        let result = self.store.find(&query).await?;
        if result.total_pages > 0 && page > result.total_pages {
            return Err(AppError::NotFound);
        }

        if page > shape.lookahead {
            deps::record(PurgeTarget::Tag(shape.tag.clone()));
        }

        let cards = result
            .docs
            .iter()
            .map(|document| listing_card(&shape, locale, document))
            .collect();
        let total_pages = result.total_pages.max(1);
        let active_category = category.filter(|_| filtered).map(str::to_string);
        let pagination = (total_pages > 1).then(|| {
            Pagination::build(page, total_pages, |number| {
                listing_href(&shape, locale, number, active_category.as_deref())
            })
        });

        Ok(ListingView {
            collection: collection.clone(),
            locale: locale.clone(),
            page,
            total_pages,
            cards,
            categories,
            range: PageRange::new(page, shape.per_page, result.total_docs),
            active_category,
            pagination,
        })
    }

    async fn categories(
        &self,
        shape: &PathShape,
        locale: &Locale,
        active: Option<&str>,
    ) -> Result<Vec<CategoryLink>, AppError> {
        let Some(category_collection) = &shape.category_collection else {
            return Ok(Vec::new());
        };
        let query = FindQuery::new(category_collection.clone(), locale.clone())
            .published()
            .page(1, CATEGORY_LIMIT)
            .sort("title");
        let documents = self.store.find(&query).await?.docs;
        Ok(documents
            .iter()
            .filter_map(|document| {
                let slug = document.slug_for(locale)?;
                Some(CategoryLink {
                    slug: slug.to_string(),
                    title: document.title.clone().unwrap_or_else(|| slug.to_string()),
                    href: listing_href(shape, locale, 1, Some(slug)),
                    active: active == Some(slug),
                })
            })
            .collect())
    }

    async fn fetch(
        &self,
        collection: &CollectionName,
        locale: &Locale,
        slug: &str,
        authenticated: bool,
    ) -> Result<Document, AppError> {
        let document = if authenticated {
            let query = FindQuery::new(collection.clone(), locale.clone())
                .slug(slug)
                .draft(true)
                .page(1, 1);
            self.store.find(&query).await?.docs.into_iter().next()
        } else {
            self.store
                .find_published_by_slug(collection, locale, slug)
                .await?
        };
        document.ok_or(AppError::NotFound)
    }

    fn context<'a>(&'a self, locale: &'a Locale, authenticated: bool) -> RenderContext<'a> {
        RenderContext::new(locale, &self.locales, &self.blocks, &self.heroes)
            .authenticated(authenticated)
    }
}

/// Every published document of `collection` in `locale`.
pub async fn published_documents(
    store: &dyn ContentStore,
    collection: &CollectionName,
    locale: &Locale,
) -> Result<Vec<Document>, AppError> {
    let query = FindQuery::new(collection.clone(), locale.clone())
        .published()
        .page(1, 100)
        .sort(NEWEST_FIRST);
    Ok(find_all(store, query).await?)
}

fn record_detail(shape: &PathShape, locale: &Locale, slug: &str) {
    deps::record(PurgeTarget::Path(CacheKey::new(
        shape.detail_path(locale, slug),
        locale.clone(),
    )));
}

fn page_view(
    collection: CollectionName,
    slug: &str,
    document: &Document,
    tree: RenderTree,
) -> PageView {
    let meta = document.meta.clone().unwrap_or_default();
    PageView {
        collection,
        slug: slug.to_string(),
        title: document.title.clone(),
        meta: MetaView {
            title: meta.title.or_else(|| document.title.clone()),
            description: meta.description,
            image: media_url(meta.image.as_ref().or(document.hero_image.as_ref())),
        },
        tree,
    }
}

fn post_hero(document: &Document) -> PostHero {
    PostHero {
        title: document.title.clone().unwrap_or_default(),
        media: document.hero_image.clone(),
        categories: category_titles(document),
        published_at: document.published_at.clone(),
    }
}

fn category_titles(document: &Document) -> Vec<String> {
    document
        .categories
        .iter()
        .filter_map(|category| category.embedded()?.title.clone())
        .collect()
}

fn listing_card(shape: &PathShape, locale: &Locale, document: &Document) -> ListingCard {
    let meta = document.meta.as_ref();
    let description = meta
        .and_then(|meta| meta.description.as_deref())
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "));
    let image = meta
        .and_then(|meta| meta.image.as_ref())
        .filter(|image| image.resolved().is_some())
        .or(document.hero_image.as_ref());
    ListingCard {
        title: document.title.clone(),
        description,
        href: document
            .slug_for(locale)
            .map(|slug| shape.detail_path(locale, slug)),
        image: media_url(image),
        categories: category_titles(document),
    }
}

fn listing_href(shape: &PathShape, locale: &Locale, page: u32, category: Option<&str>) -> String {
    let path = shape
        .listing_path(locale, page)
        .unwrap_or_else(|| format!("/{locale}"));
    match category {
        Some(category) => {
            let encoded: String =
                url::form_urlencoded::byte_serialize(category.as_bytes()).collect();
            format!("{path}?category={encoded}")
        }
        None => path,
    }
}

fn media_url(media: Option<&MediaRef>) -> Option<String> {
    media?.resolved()?.url.clone()
}
