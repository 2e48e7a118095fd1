//! Fault injection around a table store.
//!
//! Lets tests make chosen table operations hang forever or fail, and
//! records every call that reached the store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{DbError, Query, QueryResult, Row, TableStore};

/// Table operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    Upsert,
}

/// What an injected fault does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Never complete.
    Hang,
    /// Fail with a connection error.
    Fail,
}

/// Wraps a store and applies injected faults per (table, operation).
#[derive(Debug)]
pub struct FaultyStore<S> {
    inner: S,
    faults: Mutex<HashMap<(String, Operation), Fault>>,
    calls: Mutex<Vec<(String, Operation)>>,
}

impl<S: TableStore> FaultyStore<S> {
    /// Wrap a store with no faults.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make an operation on a table hang or fail.
    pub fn inject(&self, table: &str, operation: Operation, fault: Fault) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.insert((table.to_string(), operation), fault);
        }
    }

    /// Remove an injected fault.
    pub fn heal(&self, table: &str, operation: Operation) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.remove(&(table.to_string(), operation));
        }
    }

    /// Every call that reached the store, in order.
    pub fn calls(&self) -> Vec<(String, Operation)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls of one operation on one table.
    pub fn call_count(&self, table: &str, operation: Operation) -> usize {
        self.calls()
            .iter()
            .filter(|(t, op)| t == table && *op == operation)
            .count()
    }

    /// Get the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn gate(&self, table: &str, operation: Operation) -> Result<(), DbError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((table.to_string(), operation));
        }
        let fault = self
            .faults
            .lock()
            .ok()
            .and_then(|f| f.get(&(table.to_string(), operation)).copied());

        match fault {
            Some(Fault::Hang) => std::future::pending().await,
            Some(Fault::Fail) => Err(DbError::Connection(format!(
                "injected failure on {} {:?}",
                table, operation
            ))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<S: TableStore> TableStore for FaultyStore<S> {
    async fn select(&self, query: &Query) -> Result<QueryResult, DbError> {
        self.gate(&query.table, Operation::Select).await?;
        self.inner.select(query).await
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<QueryResult, DbError> {
        self.gate(table, Operation::Insert).await?;
        self.inner.insert(table, rows).await
    }

    async fn update(&self, query: &Query, changes: Row) -> Result<QueryResult, DbError> {
        self.gate(&query.table, Operation::Update).await?;
        self.inner.update(query, changes).await
    }

    async fn delete(&self, query: &Query) -> Result<QueryResult, DbError> {
        self.gate(&query.table, Operation::Delete).await?;
        self.inner.delete(query).await
    }

    async fn upsert(&self, table: &str, rows: Vec<Row>, on_conflict: &str) -> Result<QueryResult, DbError> {
        self.gate(table, Operation::Upsert).await?;
        self.inner.upsert(table, rows, on_conflict).await
    }
}
