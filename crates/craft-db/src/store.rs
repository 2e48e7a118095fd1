//! The table store seam and the typed `Db` handle over it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::{DbError, Query, QueryResult, Row};

/// Table-like access to the hosted backend.
///
/// Every mutating call returns the affected rows, so callers can tell a
/// conditional update that matched nothing from one that applied.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Read rows matching a query.
    async fn select(&self, query: &Query) -> Result<QueryResult, DbError>;

    /// Insert rows and return them as stored.
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<QueryResult, DbError>;

    /// Apply `changes` to every row matching a query; return the updated rows.
    async fn update(&self, query: &Query, changes: Row) -> Result<QueryResult, DbError>;

    /// Delete rows matching a query; return the deleted rows.
    async fn delete(&self, query: &Query) -> Result<QueryResult, DbError>;

    /// Insert rows, merging into existing rows that share `on_conflict`.
    async fn upsert(&self, table: &str, rows: Vec<Row>, on_conflict: &str) -> Result<QueryResult, DbError>;
}

/// Typed handle over a shared table store.
///
/// # Example
///
/// ```rust,ignore
/// let db = Db::new(Arc::new(MemoryStore::new()));
///
/// let regions: Vec<ShippingRegion> = db
///     .query_as(&Query::table("shipping_regions").eq("is_active", true))
///     .await?;
/// ```
#[derive(Clone)]
pub struct Db {
    store: Arc<dyn TableStore>,
}

impl Db {
    /// Wrap a table store.
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &Arc<dyn TableStore> {
        &self.store
    }

    /// Execute a query and return raw results.
    pub async fn query(&self, query: &Query) -> Result<QueryResult, DbError> {
        self.store.select(query).await
    }

    /// Execute a query and deserialize every row.
    pub async fn query_as<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>, DbError> {
        self.store.select(query).await?.deserialize_all()
    }

    /// Execute a query and deserialize the first row, if any.
    pub async fn query_one<T: DeserializeOwned>(&self, query: &Query) -> Result<Option<T>, DbError> {
        let result = self.store.select(&query.clone().limit(1)).await?;
        result.first().map(Row::deserialize).transpose()
    }

    /// Insert one record and return it as stored.
    pub async fn insert_one<S, T>(&self, table: &str, record: &S) -> Result<T, DbError>
    where
        S: Serialize + Sync,
        T: DeserializeOwned,
    {
        let row = Row::from_serialize(record)?;
        self.store.insert(table, vec![row]).await?.deserialize_one()
    }

    /// Insert several records and return them as stored.
    pub async fn insert_many<S, T>(&self, table: &str, records: &[S]) -> Result<Vec<T>, DbError>
    where
        S: Serialize + Sync,
        T: DeserializeOwned,
    {
        let rows = records
            .iter()
            .map(Row::from_serialize)
            .collect::<Result<Vec<_>, _>>()?;
        self.store.insert(table, rows).await?.deserialize_all()
    }

    /// Update matching rows; return how many changed.
    pub async fn update(&self, query: &Query, changes: Row) -> Result<usize, DbError> {
        Ok(self.store.update(query, changes).await?.len())
    }

    /// Delete matching rows; return how many were removed.
    pub async fn delete(&self, query: &Query) -> Result<usize, DbError> {
        Ok(self.store.delete(query).await?.len())
    }

    /// Insert or merge one record keyed by `on_conflict`.
    pub async fn upsert_one<S, T>(&self, table: &str, record: &S, on_conflict: &str) -> Result<T, DbError>
    where
        S: Serialize + Sync,
        T: DeserializeOwned,
    {
        let row = Row::from_serialize(record)?;
        self.store
            .upsert(table, vec![row], on_conflict)
            .await?
            .deserialize_one()
    }
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db").finish_non_exhaustive()
    }
}
