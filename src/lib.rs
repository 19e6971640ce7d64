//! Localized block-layout rendering and path-precise cache invalidation
//! for headless CMS content.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
