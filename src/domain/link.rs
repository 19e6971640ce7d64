//! Typed links: an explicit URL or a reference to another document.

use serde::Deserialize;

use super::document::{DocumentRef, DocumentValue};
use super::locale::Locale;

#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    Custom { url: Option<String> },
    Reference(DocumentRef),
}

impl LinkTarget {
    /// Site path (without locale prefix) or URL this target points at.
    ///
    /// Custom URLs pass through unchanged. References yield
    /// `/<slug>` for the primary collection and `/<collection>/<slug>`
    /// otherwise, using the referenced document's slug for `locale`. A
    /// reference that was not expanded, or whose document has no slug,
    /// resolves to nothing.
    pub fn resolve_path(&self, locale: &Locale) -> Option<String> {
        match self {
            LinkTarget::Custom { url } => url
                .as_deref()
                .filter(|url| !url.trim().is_empty())
                .map(str::to_string),
            LinkTarget::Reference(reference) => {
                let DocumentValue::Embedded(document) = &reference.value else {
                    return None;
                };
                let slug = document.slug.as_ref()?.for_locale(locale)?;
                if reference.collection.is_primary() {
                    Some(format!("/{slug}"))
                } else {
                    Some(format!("/{}/{slug}", reference.collection))
                }
            }
        }
    }
}

/// A link field as authored in the CMS.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawLink")]
pub struct Link {
    pub target: LinkTarget,
    pub label: Option<String>,
    pub new_tab: bool,
    pub appearance: Option<String>,
}

impl Link {
    pub fn custom(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            target: LinkTarget::Custom {
                url: Some(url.into()),
            },
            label: Some(label.into()),
            new_tab: false,
            appearance: None,
        }
    }

    pub fn reference(reference: DocumentRef, label: Option<String>) -> Self {
        Self {
            target: LinkTarget::Reference(reference),
            label,
            new_tab: false,
            appearance: None,
        }
    }

    pub fn resolve_path(&self, locale: &Locale) -> Option<String> {
        self.target.resolve_path(locale)
    }
}

/// Link groups are stored as rows wrapping a single link.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkRow {
    pub link: Link,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLink {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    reference: Option<DocumentRef>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    new_tab: Option<bool>,
    #[serde(default)]
    appearance: Option<String>,
}

impl From<RawLink> for Link {
    fn from(raw: RawLink) -> Self {
        let target = match (raw.kind.as_deref(), raw.reference) {
            (Some("reference"), Some(reference)) => LinkTarget::Reference(reference),
            _ => LinkTarget::Custom { url: raw.url },
        };
        Self {
            target,
            label: raw.label.filter(|label| !label.trim().is_empty()),
            new_tab: raw.new_tab.unwrap_or(false),
            appearance: raw.appearance,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn en() -> Locale {
        Locale::parse("en").expect("valid locale")
    }

    fn link(value: serde_json::Value) -> Link {
        serde_json::from_value(value).expect("link decodes")
    }

    #[test]
    fn custom_urls_pass_through_for_every_locale() {
        for url in ["https://example.com/x?y=1", "/en/already", "relative/path", "mailto:a@b.c"] {
            let link = link(json!({"type": "custom", "url": url, "label": "x"}));
            for code in ["en", "sl", "de"] {
                let locale = Locale::parse(code).expect("valid locale");
                assert_eq!(link.resolve_path(&locale).as_deref(), Some(url));
            }
        }
    }

    #[test]
    fn blank_custom_url_has_no_path() {
        let blank = link(json!({"type": "custom", "url": "  ", "label": "x"}));
        assert_eq!(blank.resolve_path(&en()), None);
        let missing = link(json!({"type": "custom", "label": "x"}));
        assert_eq!(missing.resolve_path(&en()), None);
    }

    #[test]
    fn primary_collection_has_no_segment() {
        let link = link(json!({
            "type": "reference",
            "reference": {"relationTo": "pages", "value": {"id": 1, "slug": "about"}},
            "label": "About"
        }));
        assert_eq!(link.resolve_path(&en()).as_deref(), Some("/about"));
    }

    #[test]
    fn other_collections_are_prefixed() {
        let link = link(json!({
            "type": "reference",
            "reference": {"relationTo": "posts", "value": {"id": 1, "slug": "hello"}}
        }));
        assert_eq!(link.resolve_path(&en()).as_deref(), Some("/posts/hello"));
    }

    #[test]
    fn unexpanded_reference_resolves_to_nothing() {
        let link = link(json!({
            "type": "reference",
            "reference": {"relationTo": "posts", "value": 17},
            "label": "Read more"
        }));
        assert_eq!(link.resolve_path(&en()), None);
        assert_eq!(link.label.as_deref(), Some("Read more"));
    }

    #[test]
    fn embedded_document_without_slug_resolves_to_nothing() {
        let null_slug = link(json!({
            "type": "reference",
            "reference": {"relationTo": "posts", "value": {"id": 3, "slug": null}}
        }));
        assert_eq!(null_slug.resolve_path(&en()), None);

        let empty_slug = link(json!({
            "type": "reference",
            "reference": {"relationTo": "posts", "value": {"id": 3, "slug": ""}}
        }));
        assert_eq!(empty_slug.resolve_path(&en()), None);
    }

    #[test]
    fn localized_slug_follows_requested_locale() {
        let link = link(json!({
            "type": "reference",
            "reference": {
                "relationTo": "posts",
                "value": {"id": 3, "slug": {"en": "hello", "sl": "pozdrav"}}
            }
        }));
        let sl = Locale::parse("sl").expect("valid locale");
        assert_eq!(link.resolve_path(&en()).as_deref(), Some("/posts/hello"));
        assert_eq!(link.resolve_path(&sl).as_deref(), Some("/posts/pozdrav"));
    }

    #[test]
    fn reference_type_without_reference_falls_back_to_url() {
        let link = link(json!({"type": "reference", "url": "/fallback", "newTab": true}));
        assert_eq!(link.resolve_path(&en()).as_deref(), Some("/fallback"));
        assert!(link.new_tab);
    }
}
