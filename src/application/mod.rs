//! Application services: content access, rendering and site views.

pub mod content;
pub mod error;
pub mod pagination;
pub mod render;
pub mod routes;
pub mod site;
pub mod sitemap;
pub mod static_paths;
