//! Content model: locales, documents, links, blocks and lifecycle events.

pub mod blocks;
pub mod document;
pub mod error;
pub mod hero;
pub mod link;
pub mod locale;
pub mod mutation;
pub mod rich_text;
