//! Product catalog module.
//!
//! Contains products, size tiers, categories, and the catalog cache.

mod cache;
mod category;
mod product;

pub use cache::{CatalogCache, DEFAULT_CATALOG_TTL};
pub use category::Category;
pub use product::{Product, ProductRecord, Size};
