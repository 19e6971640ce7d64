use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri, header::CONTENT_TYPE},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::application::error::AppError;
use crate::application::routes::Route;
use crate::application::site::{SiteService, ViewRequest};
use crate::application::sitemap::SitemapService;
use crate::cache::{CacheState, has_auth_cookie};
use crate::domain::locale::LocaleSet;

const SITEMAP_SUFFIX: &str = "-sitemap.xml";

#[derive(Clone)]
pub struct PublicState {
    pub site: Arc<SiteService>,
    pub sitemap: Arc<SitemapService>,
    pub cache: Option<CacheState>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PublicQuery {
    category: Option<String>,
}

/// Every public `GET`: sitemaps, home pages, details and listings.
pub(super) async fn public_page(
    State(state): State<PublicState>,
    Query(query): Query<PublicQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let route = Route::parse(uri.path(), state.site.locales(), state.site.table());

    match route {
        Route::Sitemap { collection } => match state.sitemap.sitemap_xml(&collection).await {
            Ok(body) => xml_response(body),
            Err(err) => err.into_response(),
        },
        Route::NotFound => match default_locale_redirect(&uri, state.site.locales()) {
            Some(target) => Redirect::temporary(&target).into_response(),
            None => AppError::NotFound.into_response(),
        },
        route => {
            let request = ViewRequest {
                authenticated: has_auth_cookie(&headers),
                category: query
                    .category
                    .map(|category| category.trim().to_string())
                    .filter(|category| !category.is_empty()),
            };
            match state.site.view(&route, &request).await {
                Ok(view) => Json(view).into_response(),
                Err(err) => err.into_response(),
            }
        }
    }
}

/// Where an unprefixed path lives in the default locale, query included.
fn default_locale_redirect(uri: &Uri, locales: &LocaleSet) -> Option<String> {
    let path = uri.path();
    if path.ends_with(SITEMAP_SUFFIX) || locales.resolve(path).prefixed {
        return None;
    }
    let target = locales.switch_locale(path, locales.default_locale());
    Some(match uri.query() {
        Some(query) if !query.is_empty() => format!("{target}?{query}"),
        _ => target,
    })
}

fn xml_response(body: String) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/xml")
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
