//! Documents and references to documents as the content store returns them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::blocks::Block;
use super::hero::Hero;
use super::locale::Locale;
use super::rich_text::RichText;

/// The collection whose documents are served without a collection segment.
pub const PRIMARY_COLLECTION: &str = "pages";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionName(String);

impl CollectionName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_primary(&self) -> bool {
        self.0 == PRIMARY_COLLECTION
    }
}

impl From<&str> for CollectionName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Number(i64),
    Text(String),
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Number(id) => write!(f, "{id}"),
            DocumentId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    /// Collections without drafts report no status; those documents are live.
    #[default]
    Published,
}

impl DocumentStatus {
    pub fn is_published(self) -> bool {
        matches!(self, DocumentStatus::Published)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Published => "published",
        }
    }
}

/// A document slug.
///
/// Queried in a single locale the store returns a string; queried across
/// every locale it returns one slug per locale code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Slug {
    Single(String),
    PerLocale(BTreeMap<String, String>),
}

impl Slug {
    /// The non-blank slug that applies to `locale`.
    pub fn for_locale(&self, locale: &Locale) -> Option<&str> {
        let slug = match self {
            Slug::Single(slug) => slug.as_str(),
            Slug::PerLocale(slugs) => slugs.get(locale.as_str())?.as_str(),
        };
        let slug = slug.trim();
        (!slug.is_empty()).then_some(slug)
    }
}

impl From<&str> for Slug {
    fn from(value: &str) -> Self {
        Slug::Single(value.to_string())
    }
}

/// A related document expanded inline by the store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedDocument {
    pub id: DocumentId,
    #[serde(default)]
    pub slug: Option<Slug>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub locale: Option<Locale>,
    #[serde(default)]
    pub hero_image: Option<MediaRef>,
    #[serde(default)]
    pub meta: Option<DocumentMeta>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DocumentMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<MediaRef>,
}

/// A relationship value: a bare id when the store did not expand it, or the
/// embedded document when it did.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DocumentValue {
    Id(DocumentId),
    Embedded(Box<EmbeddedDocument>),
}

impl DocumentValue {
    pub fn embedded(&self) -> Option<&EmbeddedDocument> {
        match self {
            DocumentValue::Id(_) => None,
            DocumentValue::Embedded(document) => Some(document),
        }
    }

    pub fn id(&self) -> &DocumentId {
        match self {
            DocumentValue::Id(id) => id,
            DocumentValue::Embedded(document) => &document.id,
        }
    }
}

/// A polymorphic relationship: which collection, and the value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentRef {
    #[serde(rename = "relationTo")]
    pub collection: CollectionName,
    pub value: DocumentValue,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub caption: Option<RichText>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MediaRef {
    Id(DocumentId),
    Embedded(Media),
}

impl MediaRef {
    /// The media record, if it was expanded and has a URL.
    pub fn resolved(&self) -> Option<&Media> {
        match self {
            MediaRef::Embedded(media) if media.url.as_deref().is_some_and(|u| !u.is_empty()) => {
                Some(media)
            }
            _ => None,
        }
    }
}

/// A full document of any collection, fetched in one locale.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    #[serde(default)]
    pub slug: Option<Slug>,
    #[serde(default, rename = "_status")]
    pub status: DocumentStatus,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub hero: Option<Hero>,
    #[serde(default)]
    pub layout: Vec<Block>,
    #[serde(default)]
    pub content: Option<RichText>,
    #[serde(default)]
    pub hero_image: Option<MediaRef>,
    #[serde(default)]
    pub categories: Vec<DocumentValue>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub meta: Option<DocumentMeta>,
}

impl Document {
    pub fn slug_for(&self, locale: &Locale) -> Option<&str> {
        self.slug.as_ref().and_then(|slug| slug.for_locale(locale))
    }
}
