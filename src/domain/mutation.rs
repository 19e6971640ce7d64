//! Document lifecycle changes reported by the content store.

use std::fmt;

use tracing::warn;
use vellum_api_types::{DocumentKey, MutationOperation, MutationPayload, PublicationStatus};

use super::document::{CollectionName, DocumentId, DocumentStatus};
use super::locale::{Locale, LocaleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Change,
    Delete,
}

/// How a document moved through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Created,
    Updated,
    SlugChanged,
    Published,
    Unpublished,
    Deleted,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Created => "created",
            Transition::Updated => "updated",
            Transition::SlugChanged => "slug_changed",
            Transition::Published => "published",
            Transition::Unpublished => "unpublished",
            Transition::Deleted => "deleted",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One document change.
///
/// On [`Operation::Delete`], `slug` and `status` hold the last known state of
/// the removed document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MutationEvent {
    pub collection: CollectionName,
    pub id: DocumentId,
    pub locale: Locale,
    pub slug: Option<String>,
    pub previous_slug: Option<String>,
    pub status: DocumentStatus,
    pub previous_status: Option<DocumentStatus>,
    pub operation: Operation,
}

impl MutationEvent {
    pub fn change(
        collection: impl Into<CollectionName>,
        id: DocumentId,
        locale: Locale,
        status: DocumentStatus,
    ) -> Self {
        Self {
            collection: collection.into(),
            id,
            locale,
            slug: None,
            previous_slug: None,
            status,
            previous_status: None,
            operation: Operation::Change,
        }
    }

    pub fn delete(
        collection: impl Into<CollectionName>,
        id: DocumentId,
        locale: Locale,
        last_status: DocumentStatus,
    ) -> Self {
        Self {
            operation: Operation::Delete,
            ..Self::change(collection, id, locale, last_status)
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_previous(mut self, status: DocumentStatus, slug: Option<&str>) -> Self {
        self.previous_status = Some(status);
        self.previous_slug = slug.map(str::to_string);
        self
    }

    /// Build an event from a hook payload.
    ///
    /// A locale the site does not serve falls back to the default locale.
    pub fn from_payload(payload: MutationPayload, locales: &LocaleSet) -> Self {
        let requested = payload.locale.as_deref();
        let locale = locales.get_or_default(requested).clone();
        if let Some(code) = requested
            && locales.get(code).is_none()
        {
            warn!(
                collection = %payload.collection,
                requested_locale = code,
                fallback_locale = %locale,
                "Mutation event names an unconfigured locale; using default"
            );
        }

        Self {
            collection: CollectionName::new(payload.collection),
            id: match payload.id {
                DocumentKey::Number(id) => DocumentId::Number(id),
                DocumentKey::Text(id) => DocumentId::Text(id),
            },
            locale,
            slug: non_blank(payload.slug),
            previous_slug: non_blank(payload.previous_slug),
            status: status_from_wire(payload.status),
            previous_status: payload.previous_status.map(status_from_wire),
            operation: match payload.operation {
                MutationOperation::Change => Operation::Change,
                MutationOperation::Delete => Operation::Delete,
            },
        }
    }

    pub fn transition(&self) -> Transition {
        if self.operation == Operation::Delete {
            return Transition::Deleted;
        }
        let Some(previous) = self.previous_status else {
            return Transition::Created;
        };
        match (previous.is_published(), self.status.is_published()) {
            (true, false) => Transition::Unpublished,
            (false, true) => Transition::Published,
            _ if self.previous_slug.is_some() && self.previous_slug != self.slug => {
                Transition::SlugChanged
            }
            _ => Transition::Updated,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn status_from_wire(status: PublicationStatus) -> DocumentStatus {
    match status {
        PublicationStatus::Draft => DocumentStatus::Draft,
        PublicationStatus::Published => DocumentStatus::Published,
    }
}
