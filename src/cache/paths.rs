//! Path shapes: where each collection's documents and listings live.
//!
//! A [`PathShape`] is used in both directions. The planner renders its
//! templates to find the paths a mutation touches, and the router matches
//! incoming paths against the same templates.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::document::CollectionName;
use crate::domain::locale::Locale;

use super::keys::AggregateTag;

pub const DEFAULT_PER_PAGE: u32 = 6;
const HOME_SLUG: &str = "home";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathTemplateError {
    #[error("template `{template}` must start with `/`")]
    NotAbsolute { template: String },
    #[error("template `{template}` is missing `{{{placeholder}}}`")]
    MissingPlaceholder {
        template: String,
        placeholder: &'static str,
    },
    #[error("template `{template}` uses `{{{placeholder}}}` more than once")]
    DuplicatePlaceholder {
        template: String,
        placeholder: &'static str,
    },
    #[error("template `{template}` may not use `{{{name}}}`")]
    UnexpectedPlaceholder { template: String, name: String },
    #[error("template `{template}` mixes a placeholder with literal text in `{segment}`")]
    MixedSegment { template: String, segment: String },
    #[error("collection `{collection}` has more than one path shape")]
    DuplicateCollection { collection: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Locale,
    Slug,
    Page,
}

impl Placeholder {
    pub fn name(self) -> &'static str {
        match self {
            Placeholder::Locale => "locale",
            Placeholder::Slug => "slug",
            Placeholder::Page => "page",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "locale" => Some(Placeholder::Locale),
            "slug" => Some(Placeholder::Slug),
            "page" => Some(Placeholder::Page),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Placeholder),
}

/// Values captured from a path that matched a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Captures<'p> {
    pub locale: &'p str,
    pub slug: Option<&'p str>,
    pub page: Option<&'p str>,
}

/// A path pattern such as `/{locale}/posts/{slug}`.
///
/// Holds `{locale}` exactly once and at most one of `{slug}` or `{page}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template whose only placeholder besides `{locale}` is
    /// `extra` (or none).
    pub fn parse(template: &str, extra: Option<Placeholder>) -> Result<Self, PathTemplateError> {
        let template = template.trim();
        if !template.starts_with('/') {
            return Err(PathTemplateError::NotAbsolute {
                template: template.to_string(),
            });
        }

        let mut segments = Vec::new();
        for raw in template.split('/').filter(|segment| !segment.is_empty()) {
            if let Some(name) = raw.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
                let placeholder = Placeholder::from_name(name)
                    .filter(|p| *p == Placeholder::Locale || Some(*p) == extra)
                    .ok_or_else(|| PathTemplateError::UnexpectedPlaceholder {
                        template: template.to_string(),
                        name: name.to_string(),
                    })?;
                segments.push(Segment::Slot(placeholder));
            } else if raw.contains(['{', '}']) {
                return Err(PathTemplateError::MixedSegment {
                    template: template.to_string(),
                    segment: raw.to_string(),
                });
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }

        for placeholder in std::iter::once(Placeholder::Locale).chain(extra) {
            let count = segments
                .iter()
                .filter(|segment| **segment == Segment::Slot(placeholder))
                .count();
            if count == 0 {
                return Err(PathTemplateError::MissingPlaceholder {
                    template: template.to_string(),
                    placeholder: placeholder.name(),
                });
            }
            if count > 1 {
                return Err(PathTemplateError::DuplicatePlaceholder {
                    template: template.to_string(),
                    placeholder: placeholder.name(),
                });
            }
        }

        Ok(Self { segments })
    }

    /// `/{locale}/<literals...>/{extra}` without parsing.
    fn conventional(literals: &[&str], extra: Option<Placeholder>) -> Self {
        let mut segments = vec![Segment::Slot(Placeholder::Locale)];
        segments.extend(
            literals
                .iter()
                .filter(|literal| !literal.is_empty())
                .map(|literal| Segment::Literal((*literal).to_string())),
        );
        segments.extend(extra.map(Segment::Slot));
        Self { segments }
    }

    /// Render with `value` filling the `{slug}` or `{page}` slot.
    pub fn render(&self, locale: &Locale, value: &str) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(literal) => path.push_str(literal),
                Segment::Slot(Placeholder::Locale) => path.push_str(locale.as_str()),
                Segment::Slot(_) => path.push_str(value),
            }
        }
        path
    }

    /// Match a request path, segment by segment.
    pub fn captures<'p>(&self, path: &'p str) -> Option<Captures<'p>> {
        let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captures = Captures {
            locale: "",
            slug: None,
            page: None,
        };
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Slot(Placeholder::Locale) => captures.locale = part,
                Segment::Slot(Placeholder::Slug) => captures.slug = Some(part),
                Segment::Slot(Placeholder::Page) => captures.page = Some(part),
            }
        }
        Some(captures)
    }

    /// Number of literal segments; more literals means a more specific match.
    pub fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Literal(_)))
            .count()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => write!(f, "/{literal}")?,
                Segment::Slot(placeholder) => write!(f, "/{{{}}}", placeholder.name())?,
            }
        }
        Ok(())
    }
}

/// Listing templates for page 1 and for pages after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingTemplates {
    pub first: PathTemplate,
    pub page: PathTemplate,
}

/// Where one collection's outputs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathShape {
    pub collection: CollectionName,
    pub detail: PathTemplate,
    pub listing: Option<ListingTemplates>,
    /// Listing pages purged per locale on every mutation.
    pub lookahead: u32,
    pub per_page: u32,
    pub tag: AggregateTag,
    /// Slug served at `/{locale}` instead of its detail path.
    pub home_slug: Option<String>,
    /// Collection whose slugs filter the listing (`?category=`).
    pub category_collection: Option<CollectionName>,
}

impl PathShape {
    /// The shape used for collections without configuration.
    pub fn conventional(collection: CollectionName, lookahead: u32) -> Self {
        let tag = AggregateTag::new(format!("{collection}-sitemap"));
        if collection.is_primary() {
            return Self {
                detail: PathTemplate::conventional(&[], Some(Placeholder::Slug)),
                listing: None,
                lookahead,
                per_page: DEFAULT_PER_PAGE,
                tag,
                home_slug: Some(HOME_SLUG.to_string()),
                category_collection: None,
                collection,
            };
        }

        let name = collection.as_str().to_string();
        Self {
            detail: PathTemplate::conventional(&[&name], Some(Placeholder::Slug)),
            listing: Some(ListingTemplates {
                first: PathTemplate::conventional(&[&name], None),
                page: PathTemplate::conventional(&[&name, "page"], Some(Placeholder::Page)),
            }),
            lookahead,
            per_page: DEFAULT_PER_PAGE,
            tag,
            home_slug: None,
            category_collection: None,
            collection,
        }
    }

    /// Build a shape from configuration, starting from the conventional one.
    pub fn from_spec(
        spec: &PathShapeSpec,
        default_lookahead: u32,
    ) -> Result<Self, PathTemplateError> {
        let mut shape =
            Self::conventional(CollectionName::new(spec.collection.trim()), default_lookahead);

        if let Some(detail) = &spec.detail {
            shape.detail = PathTemplate::parse(detail, Some(Placeholder::Slug))?;
        }
        match spec.listing.as_deref().map(str::trim) {
            Some("") => shape.listing = None,
            Some(first) => {
                let page = spec
                    .listing_page
                    .clone()
                    .unwrap_or_else(|| format!("{}/page/{{page}}", first.trim_end_matches('/')));
                shape.listing = Some(ListingTemplates {
                    first: PathTemplate::parse(first, None)?,
                    page: PathTemplate::parse(&page, Some(Placeholder::Page))?,
                });
            }
            None => {
                if let (Some(page), Some(listing)) = (&spec.listing_page, shape.listing.as_mut()) {
                    listing.page = PathTemplate::parse(page, Some(Placeholder::Page))?;
                }
            }
        }

        if let Some(lookahead) = spec.lookahead {
            shape.lookahead = lookahead;
        }
        if let Some(per_page) = spec.per_page {
            shape.per_page = per_page;
        }
        if let Some(tag) = &spec.tag {
            shape.tag = AggregateTag::new(tag.trim());
        }
        if spec.home_slug.is_some() {
            shape.home_slug = spec
                .home_slug
                .as_deref()
                .map(str::trim)
                .filter(|slug| !slug.is_empty())
                .map(str::to_string);
        }
        shape.category_collection = spec
            .category_collection
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(CollectionName::new);

        Ok(shape)
    }

    pub fn with_category_collection(mut self, collection: impl Into<CollectionName>) -> Self {
        self.category_collection = Some(collection.into());
        self
    }

    pub fn detail_path(&self, locale: &Locale, slug: &str) -> String {
        if self.home_slug.as_deref() == Some(slug) {
            return format!("/{locale}");
        }
        self.detail.render(locale, slug)
    }

    /// Path of listing page `page` (1-based); `None` without a listing.
    pub fn listing_path(&self, locale: &Locale, page: u32) -> Option<String> {
        let listing = self.listing.as_ref()?;
        Some(if page <= 1 {
            listing.first.render(locale, "")
        } else {
            listing.page.render(locale, &page.to_string())
        })
    }

    pub fn has_listing(&self) -> bool {
        self.listing.is_some()
    }

    pub fn sitemap_path(&self) -> String {
        format!("/{}-sitemap.xml", self.collection)
    }
}

/// One `[[collections]]` entry of the configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathShapeSpec {
    pub collection: String,
    #[serde(default)]
    pub detail: Option<String>,
    /// Page-1 listing template; an empty string disables the listing.
    #[serde(default)]
    pub listing: Option<String>,
    #[serde(default)]
    pub listing_page: Option<String>,
    #[serde(default)]
    pub lookahead: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub home_slug: Option<String>,
    #[serde(default)]
    pub category_collection: Option<String>,
}

/// Configured shapes keyed by collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathShapeTable {
    shapes: BTreeMap<CollectionName, PathShape>,
    default_lookahead: u32,
}

impl PathShapeTable {
    pub fn new(
        shapes: impl IntoIterator<Item = PathShape>,
        default_lookahead: u32,
    ) -> Result<Self, PathTemplateError> {
        let mut table = BTreeMap::new();
        for shape in shapes {
            let collection = shape.collection.clone();
            if table.insert(collection.clone(), shape).is_some() {
                return Err(PathTemplateError::DuplicateCollection {
                    collection: collection.to_string(),
                });
            }
        }
        Ok(Self {
            shapes: table,
            default_lookahead,
        })
    }

    /// Pages at the site root and posts under `/posts` filtered by category.
    pub fn standard(default_lookahead: u32) -> Self {
        let shapes = [
            PathShape::conventional(CollectionName::new("pages"), default_lookahead),
            PathShape::conventional(CollectionName::new("posts"), default_lookahead)
                .with_category_collection("postCategories"),
        ];
        Self {
            shapes: shapes
                .into_iter()
                .map(|shape| (shape.collection.clone(), shape))
                .collect(),
            default_lookahead,
        }
    }

    pub fn from_specs(
        specs: &[PathShapeSpec],
        default_lookahead: u32,
    ) -> Result<Self, PathTemplateError> {
        let shapes = specs
            .iter()
            .map(|spec| PathShape::from_spec(spec, default_lookahead))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(shapes, default_lookahead)
    }

    /// The configured shape, or the conventional one for unknown collections.
    pub fn shape_for(&self, collection: &CollectionName) -> Cow<'_, PathShape> {
        match self.shapes.get(collection) {
            Some(shape) => Cow::Borrowed(shape),
            None => Cow::Owned(PathShape::conventional(
                collection.clone(),
                self.default_lookahead,
            )),
        }
    }

    pub fn get(&self, collection: &CollectionName) -> Option<&PathShape> {
        self.shapes.get(collection)
    }

    pub fn shapes(&self) -> impl Iterator<Item = &PathShape> {
        self.shapes.values()
    }

    pub fn default_lookahead(&self) -> u32 {
        self.default_lookahead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> Locale {
        Locale::parse("en").expect("valid locale")
    }

    #[test]
    fn parse_validates_templates() {
        assert!(matches!(
            PathTemplate::parse("{locale}/{slug}", Some(Placeholder::Slug)),
            Err(PathTemplateError::NotAbsolute { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/posts/{slug}", Some(Placeholder::Slug)),
            Err(PathTemplateError::MissingPlaceholder { placeholder: "locale", .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/{locale}/posts", Some(Placeholder::Slug)),
            Err(PathTemplateError::MissingPlaceholder { placeholder: "slug", .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/{locale}/{locale}/{slug}", Some(Placeholder::Slug)),
            Err(PathTemplateError::DuplicatePlaceholder { placeholder: "locale", .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/{locale}/{id}", Some(Placeholder::Slug)),
            Err(PathTemplateError::UnexpectedPlaceholder { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/{locale}/posts", Some(Placeholder::Page)),
            Err(PathTemplateError::MissingPlaceholder { placeholder: "page", .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/{locale}/p-{slug}", Some(Placeholder::Slug)),
            Err(PathTemplateError::MixedSegment { .. })
        ));
    }

    #[test]
    fn render_and_capture_are_inverse() {
        let template =
            PathTemplate::parse("/{locale}/blog/{slug}/", Some(Placeholder::Slug)).expect("valid");
        assert_eq!(template.to_string(), "/{locale}/blog/{slug}");

        let path = template.render(&en(), "hello");
        assert_eq!(path, "/en/blog/hello");

        let captures = template.captures(&path).expect("path matches");
        assert_eq!(captures.locale, "en");
        assert_eq!(captures.slug, Some("hello"));
        assert_eq!(template.captures("/en/news/hello"), None);
        assert_eq!(template.captures("/en/blog"), None);
    }

    #[test]
    fn conventional_shapes() {
        let pages = PathShape::conventional(CollectionName::new("pages"), 5);
        assert_eq!(pages.detail_path(&en(), "about"), "/en/about");
        assert_eq!(pages.detail_path(&en(), "home"), "/en");
        assert!(!pages.has_listing());

        let events = PathShape::conventional(CollectionName::new("events"), 3);
        assert_eq!(events.detail_path(&en(), "expo"), "/en/events/expo");
        assert_eq!(events.listing_path(&en(), 1).as_deref(), Some("/en/events"));
        assert_eq!(events.listing_path(&en(), 4).as_deref(), Some("/en/events/page/4"));
        assert_eq!(events.tag.as_str(), "events-sitemap");
        assert_eq!(events.sitemap_path(), "/events-sitemap.xml");
    }

    #[test]
    fn spec_overrides_conventional_shape() {
        let spec = PathShapeSpec {
            collection: "programs".to_string(),
            detail: Some("/{locale}/programi/{slug}".to_string()),
            listing: Some("/{locale}/programi".to_string()),
            lookahead: Some(2),
            ..Default::default()
        };
        let shape = PathShape::from_spec(&spec, 5).expect("valid spec");
        assert_eq!(shape.detail_path(&en(), "yoga"), "/en/programi/yoga");
        assert_eq!(shape.listing_path(&en(), 2).as_deref(), Some("/en/programi/page/2"));
        assert_eq!(shape.lookahead, 2);
        assert_eq!(shape.tag.as_str(), "programs-sitemap");
    }

    #[test]
    fn empty_listing_disables_it() {
        let spec = PathShapeSpec {
            collection: "legal".to_string(),
            listing: Some(String::new()),
            ..Default::default()
        };
        let shape = PathShape::from_spec(&spec, 5).expect("valid spec");
        assert!(!shape.has_listing());
        assert_eq!(shape.listing_path(&en(), 1), None);
    }

    #[test]
    fn table_falls_back_to_conventional_shape() {
        let table = PathShapeTable::standard(5);
        let posts = table.shape_for(&CollectionName::new("posts"));
        assert!(matches!(posts, Cow::Borrowed(_)));
        assert_eq!(
            posts.category_collection,
            Some(CollectionName::new("postCategories"))
        );

        let unknown = table.shape_for(&CollectionName::new("news"));
        assert!(matches!(unknown, Cow::Owned(_)));
        assert_eq!(unknown.detail_path(&en(), "x"), "/en/news/x");
    }

    #[test]
    fn table_rejects_duplicate_collections() {
        let specs = vec![
            PathShapeSpec {
                collection: "posts".to_string(),
                ..Default::default()
            },
            PathShapeSpec {
                collection: "posts".to_string(),
                ..Default::default()
            },
        ];
        assert!(matches!(
            PathShapeTable::from_specs(&specs, 5),
            Err(PathTemplateError::DuplicateCollection { .. })
        ));
    }
}
