//! Cache key definitions.
//!
//! A [`CacheKey`] names one rendered path in one locale. Stored responses
//! are keyed by [`StoreKey`], which adds a hash of the query string so
//! filtered variants of a page share the purge target of the page itself.

use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use vellum_api_types::{PurgeReport, PurgedPath};

use crate::domain::locale::Locale;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub path: String,
    pub locale: Locale,
}

impl CacheKey {
    pub fn new(path: impl Into<String>, locale: Locale) -> Self {
        Self {
            path: path.into(),
            locale,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.path, self.locale)
    }
}

/// Name of a group of outputs purged together (e.g. a sitemap).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AggregateTag(String);

impl AggregateTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AggregateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PurgeTarget {
    Path(CacheKey),
    Tag(AggregateTag),
}

/// An ordered, duplicate-free set of purge targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeSet(BTreeSet<PurgeTarget>);

impl PurgeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: PurgeTarget) -> bool {
        self.0.insert(target)
    }

    pub fn insert_path(&mut self, path: impl Into<String>, locale: Locale) -> bool {
        self.insert(PurgeTarget::Path(CacheKey::new(path, locale)))
    }

    pub fn insert_tag(&mut self, tag: AggregateTag) -> bool {
        self.insert(PurgeTarget::Tag(tag))
    }

    /// Add every target of `other`.
    pub fn merge(&mut self, other: &PurgeSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn contains(&self, target: &PurgeTarget) -> bool {
        self.0.contains(target)
    }

    /// Whether any locale's entry for `path` is in the set.
    pub fn contains_path(&self, path: &str) -> bool {
        self.paths().any(|key| key.path == path)
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.tags().any(|t| t.as_str() == tag)
    }

    pub fn paths(&self) -> impl Iterator<Item = &CacheKey> {
        self.0.iter().filter_map(|target| match target {
            PurgeTarget::Path(key) => Some(key),
            PurgeTarget::Tag(_) => None,
        })
    }

    pub fn tags(&self) -> impl Iterator<Item = &AggregateTag> {
        self.0.iter().filter_map(|target| match target {
            PurgeTarget::Tag(tag) => Some(tag),
            PurgeTarget::Path(_) => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PurgeTarget> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_report(&self) -> PurgeReport {
        PurgeReport {
            paths: self
                .paths()
                .map(|key| PurgedPath {
                    path: key.path.clone(),
                    locale: key.locale.to_string(),
                })
                .collect(),
            tags: self.tags().map(|tag| tag.to_string()).collect(),
        }
    }
}

impl FromIterator<PurgeTarget> for PurgeSet {
    fn from_iter<I: IntoIterator<Item = PurgeTarget>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PurgeSet {
    type Item = &'a PurgeTarget;
    type IntoIter = std::collections::btree_set::Iter<'a, PurgeTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for PurgeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PurgeSet {{ paths: {}, tags: {} }}",
            self.paths().count(),
            self.tags().count()
        )
    }
}

/// Key of one stored response variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub key: CacheKey,
    pub variant: u64,
}

/// Compute a hash for any hashable value.
pub fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Hash a query string for store key generation.
pub fn hash_query(query: &str) -> u64 {
    hash_value(&query)
}
