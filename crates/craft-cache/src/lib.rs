//! Durable client-side key-value storage for CoffeeCraft.
//!
//! Holds the state that must survive a restart of the storefront client:
//! the cart lines, the applied promocode and the signed-in session. Values
//! are stored as JSON, either in memory or in a single JSON file that is
//! rewritten on every change.
//!
//! # Example
//!
//! ```rust,ignore
//! use craft_cache::{cache_key, Cache};
//!
//! let cache = Cache::open_file(".craft/state.json")?;
//!
//! // Store a value
//! cache.set(&cache_key!("cart", "lines"), &lines)?;
//!
//! // Retrieve a value
//! let lines: Option<Vec<LineItem>> = cache.get("cart:lines")?;
//!
//! // Delete a value
//! cache.delete("cart:lines")?;
//! ```

mod backend;
mod error;
mod kv;

pub use backend::{FileBackend, KvBackend, MemoryBackend};
pub use error::CacheError;
pub use kv::Cache;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{cache_key, Cache, CacheError, KvBackend};
}
