//! Table-oriented data access for CoffeeCraft.
//!
//! The storefront reads and writes a handful of tables on a hosted
//! Postgres backend (`products`, `categories`, `orders`, `order_items`,
//! `promocodes`, `shipping_regions`, `profiles`). Everything goes through the
//! [`TableStore`] trait, implemented over PostgREST for production and in
//! memory for development and tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use craft_db::{Db, MemoryStore, Query};
//! use std::sync::Arc;
//!
//! let db = Db::new(Arc::new(MemoryStore::new()));
//!
//! let order: OrderRecord = db.insert_one("orders", &new_order).await?;
//!
//! let items: Vec<OrderItemRecord> = db
//!     .query_as(&Query::table("order_items").eq("order_id", order.id.as_str()))
//!     .await?;
//! ```

mod error;
mod fault;
mod memory;
mod query;
mod rest;
mod store;
mod types;

pub use error::DbError;
pub use fault::{Fault, FaultyStore, Operation};
pub use memory::MemoryStore;
pub use query::{Filter, OrderBy, Query};
pub use rest::RestStore;
pub use store::{Db, TableStore};
pub use types::{QueryResult, Row, Value};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Db, DbError, Query, QueryResult, Row, TableStore, Value};
}
