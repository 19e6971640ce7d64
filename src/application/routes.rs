//! Public route matching.
//!
//! Incoming paths are matched against the same [`PathShape`] templates the
//! invalidation planner renders, so a page is always served from the path
//! that gets purged for it.

use std::fmt;

use crate::cache::paths::{PathShape, PathShapeTable, PathTemplate};
use crate::domain::document::CollectionName;
use crate::domain::locale::{Locale, LocaleSet};

const SITEMAP_SUFFIX: &str = "-sitemap.xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Sitemap {
        collection: CollectionName,
    },
    Home {
        locale: Locale,
    },
    Listing {
        collection: CollectionName,
        locale: Locale,
        page: u32,
    },
    Detail {
        collection: CollectionName,
        locale: Locale,
        slug: String,
    },
    NotFound,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Sitemap { collection } => write!(f, "sitemap({collection})"),
            Route::Home { locale } => write!(f, "home({locale})"),
            Route::Listing {
                collection,
                locale,
                page,
            } => write!(f, "listing({collection}, {locale}, page {page})"),
            Route::Detail {
                collection,
                locale,
                slug,
            } => write!(f, "detail({collection}, {locale}, {slug})"),
            Route::NotFound => f.write_str("not-found"),
        }
    }
}

/// A template match competing for the route.
struct Candidate {
    literals: usize,
    listing: bool,
    route: Route,
}

impl Route {
    /// Match `path` (without query string).
    ///
    /// More literal segments win; on a tie a listing beats a detail page.
    /// Explicit listing pages must be numbered 2 or higher.
    pub fn parse(path: &str, locales: &LocaleSet, table: &PathShapeTable) -> Route {
        if let Some(route) = parse_sitemap(path, table) {
            return route;
        }

        let resolved = locales.resolve(path);
        if !resolved.prefixed {
            return Route::NotFound;
        }
        if resolved.remainder == "/" {
            return Route::Home {
                locale: resolved.locale.clone(),
            };
        }

        table
            .shapes()
            .flat_map(|shape| candidates(shape, path, locales))
            .max_by_key(|candidate| (candidate.literals, candidate.listing))
            .map(|candidate| candidate.route)
            .unwrap_or(Route::NotFound)
    }

    pub fn locale(&self) -> Option<&Locale> {
        match self {
            Route::Home { locale }
            | Route::Listing { locale, .. }
            | Route::Detail { locale, .. } => Some(locale),
            Route::Sitemap { .. } | Route::NotFound => None,
        }
    }
}

fn parse_sitemap(path: &str, table: &PathShapeTable) -> Option<Route> {
    let name = path.strip_prefix('/')?.strip_suffix(SITEMAP_SUFFIX)?;
    if name.is_empty() || name.contains('/') {
        return None;
    }
    let collection = CollectionName::new(name);
    Some(match table.get(&collection) {
        Some(_) => Route::Sitemap { collection },
        None => Route::NotFound,
    })
}

fn candidates(shape: &PathShape, path: &str, locales: &LocaleSet) -> Vec<Candidate> {
    let mut found = Vec::new();

    if let Some((locale, slug)) = capture(&shape.detail, path, locales) {
        let slug = slug.unwrap_or_default();
        let route = if shape.home_slug.as_deref() == Some(slug) {
            Route::Home { locale }
        } else {
            Route::Detail {
                collection: shape.collection.clone(),
                locale,
                slug: slug.to_string(),
            }
        };
        found.push(Candidate {
            literals: shape.detail.literal_count(),
            listing: false,
            route,
        });
    }

    if let Some(listing) = &shape.listing {
        if let Some((locale, _)) = capture(&listing.first, path, locales) {
            found.push(Candidate {
                literals: listing.first.literal_count(),
                listing: true,
                route: Route::Listing {
                    collection: shape.collection.clone(),
                    locale,
                    page: 1,
                },
            });
        }
        if let Some(captures) = listing.page.captures(path)
            && let Some(locale) = locales.get(captures.locale)
            && let Some(page) = captures.page.and_then(|page| page.parse::<u32>().ok())
            && page >= 2
        {
            found.push(Candidate {
                literals: listing.page.literal_count(),
                listing: true,
                route: Route::Listing {
                    collection: shape.collection.clone(),
                    locale: locale.clone(),
                    page,
                },
            });
        }
    }

    found
}

fn capture<'p>(
    template: &PathTemplate,
    path: &'p str,
    locales: &LocaleSet,
) -> Option<(Locale, Option<&'p str>)> {
    let captures = template.captures(path)?;
    let locale = locales.get(captures.locale)?.clone();
    Some((locale, captures.slug))
}
