//! In-process table store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value as Json};

use crate::query::compare_json;
use crate::{DbError, Query, QueryResult, Row, TableStore};

type Table = Vec<Map<String, Json>>;

/// A table store held in memory.
///
/// Inserted rows get an `id` (UUID v4) and a `created_at` timestamp when
/// they do not carry one. Used for local development and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Table>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with JSON objects, builder style.
    pub fn with_rows(self, table: &str, rows: impl IntoIterator<Item = Json>) -> Self {
        if let Ok(mut tables) = self.tables.lock() {
            let entry = tables.entry(table.to_string()).or_default();
            entry.extend(rows.into_iter().filter_map(|row| match row {
                Json::Object(map) => Some(map),
                _ => None,
            }));
        }
        self
    }

    /// Snapshot every row of a table.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .map(|tables| {
                tables
                    .get(table)
                    .map(|rows| rows.iter().cloned().map(Row::from).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Count the rows of a table.
    pub fn count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .map(|tables| tables.get(table).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut HashMap<String, Table>) -> T) -> Result<T, DbError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| DbError::QueryError("memory store lock poisoned".to_string()))?;
        Ok(f(&mut tables))
    }
}

fn stamp(mut row: Map<String, Json>) -> Map<String, Json> {
    if !matches!(row.get("id"), Some(Json::String(_)) | Some(Json::Number(_))) {
        row.insert("id".to_string(), Json::String(uuid::Uuid::new_v4().to_string()));
    }
    if !matches!(row.get("created_at"), Some(Json::String(_))) {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
        row.insert("created_at".to_string(), Json::String(now));
    }
    row
}

fn merge(target: &mut Map<String, Json>, changes: &Map<String, Json>) {
    for (column, value) in changes {
        target.insert(column.clone(), value.clone());
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn select(&self, query: &Query) -> Result<QueryResult, DbError> {
        self.with_tables(|tables| {
            let mut rows: Table = tables
                .get(&query.table)
                .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
                .unwrap_or_default();

            if let Some(ref order) = query.order {
                // Reverse first so ties keep newest-first under a descending sort.
                if order.descending {
                    rows.reverse();
                    rows.sort_by(|a, b| compare_json(b.get(&order.column), a.get(&order.column)));
                } else {
                    rows.sort_by(|a, b| compare_json(a.get(&order.column), b.get(&order.column)));
                }
            }
            if let Some(limit) = query.limit {
                rows.truncate(limit);
            }

            QueryResult::new(rows.into_iter().map(Row::from).collect())
        })
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<QueryResult, DbError> {
        self.with_tables(|tables| {
            let stored: Table = rows.into_iter().map(|r| stamp(r.into_map())).collect();
            tables
                .entry(table.to_string())
                .or_default()
                .extend(stored.iter().cloned());
            QueryResult::new(stored.into_iter().map(Row::from).collect())
        })
    }

    async fn update(&self, query: &Query, changes: Row) -> Result<QueryResult, DbError> {
        self.with_tables(|tables| {
            let mut updated = Vec::new();
            if let Some(rows) = tables.get_mut(&query.table) {
                for row in rows.iter_mut().filter(|r| query.matches(r)) {
                    merge(row, changes.as_map());
                    updated.push(Row::from(row.clone()));
                }
            }
            QueryResult::new(updated)
        })
    }

    async fn delete(&self, query: &Query) -> Result<QueryResult, DbError> {
        self.with_tables(|tables| {
            let mut deleted = Vec::new();
            if let Some(rows) = tables.get_mut(&query.table) {
                let (gone, kept): (Table, Table) = rows.drain(..).partition(|r| query.matches(r));
                *rows = kept;
                deleted.extend(gone.into_iter().map(Row::from));
            }
            QueryResult::new(deleted)
        })
    }

    async fn upsert(&self, table: &str, rows: Vec<Row>, on_conflict: &str) -> Result<QueryResult, DbError> {
        self.with_tables(|tables| {
            let existing = tables.entry(table.to_string()).or_default();
            let mut stored = Vec::with_capacity(rows.len());

            for row in rows {
                let row = row.into_map();
                let key = row.get(on_conflict).cloned();
                let position = key
                    .as_ref()
                    .and_then(|k| existing.iter().position(|r| r.get(on_conflict) == Some(k)));

                match position {
                    Some(index) => {
                        merge(&mut existing[index], &row);
                        stored.push(Row::from(existing[index].clone()));
                    }
                    None => {
                        let row = stamp(row);
                        existing.push(row.clone());
                        stored.push(Row::from(row));
                    }
                }
            }

            QueryResult::new(stored)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new().with_rows(
            "promocodes",
            vec![
                json!({ "id": "p1", "code": "SAVE10", "used_count": 0, "is_active": true }),
                json!({ "id": "p2", "code": "OLD", "used_count": 5, "is_active": false }),
            ],
        )
    }

    #[tokio::test]
    async fn test_select_with_filters() {
        let store = store();
        let result = store
            .select(&Query::table("promocodes").eq("is_active", true))
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.first().unwrap().get_str("code"), Some("SAVE10"));
    }

    #[tokio::test]
    async fn test_insert_stamps_id_and_created_at() {
        let store = MemoryStore::new();
        let result = store
            .insert("orders", vec![Row::new().with("status", "pending")])
            .await
            .unwrap();
        let row = result.first().unwrap();
        assert!(row.get_str("id").is_some());
        assert!(row.get_str("created_at").is_some());
        assert_eq!(store.count("orders"), 1);
    }

    #[tokio::test]
    async fn test_conditional_update() {
        let store = store();
        let query = Query::table("promocodes").eq("id", "p1").eq("used_count", 0);

        let first = store.update(&query, Row::new().with("used_count", 1)).await.unwrap();
        assert_eq!(first.len(), 1);

        // The guard no longer matches once the count moved.
        let second = store.update(&query, Row::new().with("used_count", 1)).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_delete_returns_rows() {
        let store = store();
        let deleted = store.delete(&Query::table("promocodes").eq("id", "p2")).await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(store.count("promocodes"), 1);
    }

    #[tokio::test]
    async fn test_upsert_merges_on_conflict() {
        let store = MemoryStore::new();
        store
            .upsert("profiles", vec![Row::new().with("id", "u1").with("city", "Cairo")], "id")
            .await
            .unwrap();
        store
            .upsert("profiles", vec![Row::new().with("id", "u1").with("phone", "0100")], "id")
            .await
            .unwrap();

        let rows = store.rows("profiles");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("city"), Some("Cairo"));
        assert_eq!(rows[0].get_str("phone"), Some("0100"));
    }

    #[tokio::test]
    async fn test_order_desc_keeps_newest_first_on_ties() {
        let store = MemoryStore::new().with_rows(
            "orders",
            vec![
                json!({ "id": "a", "created_at": "2024-01-01T00:00:00Z" }),
                json!({ "id": "b", "created_at": "2024-01-01T00:00:00Z" }),
                json!({ "id": "c", "created_at": "2024-01-02T00:00:00Z" }),
            ],
        );
        let result = store
            .select(&Query::table("orders").order_desc("created_at"))
            .await
            .unwrap();
        let ids: Vec<_> = result.iter().filter_map(|r| r.get_str("id")).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }
}
