//! PostgREST table store for the hosted backend.

use async_trait::async_trait;
use craft_data::{execute_json, FetchClient};
use reqwest::{Method, RequestBuilder};

use crate::{DbError, Query, QueryResult, Row, TableStore};

const RETURN_REPRESENTATION: &str = "return=representation";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

/// Table store speaking the PostgREST dialect under `rest/v1/`.
///
/// No time bound is applied here; callers bound each call by the step it
/// belongs to.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: FetchClient,
}

impl RestStore {
    /// Create a store over a configured backend client.
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }

    /// Get the backend client.
    pub fn client(&self) -> &FetchClient {
        &self.client
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client.request(method, &format!("rest/v1/{}", table))
    }

    async fn rows(&self, builder: RequestBuilder, table: &str) -> Result<QueryResult, DbError> {
        let rows: Vec<Row> = execute_json(builder).await.map_err(|e| {
            tracing::debug!(table, error = %e, "table request failed");
            DbError::from(e)
        })?;
        Ok(QueryResult::new(rows))
    }
}

#[async_trait]
impl TableStore for RestStore {
    async fn select(&self, query: &Query) -> Result<QueryResult, DbError> {
        let builder = self
            .request(Method::GET, &query.table)
            .query(&[("select", "*")])
            .query(&query.to_pairs());
        self.rows(builder, &query.table).await
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<QueryResult, DbError> {
        let builder = self
            .request(Method::POST, table)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&rows);
        self.rows(builder, table).await
    }

    async fn update(&self, query: &Query, changes: Row) -> Result<QueryResult, DbError> {
        let builder = self
            .request(Method::PATCH, &query.table)
            .query(&query.to_pairs())
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&changes);
        self.rows(builder, &query.table).await
    }

    async fn delete(&self, query: &Query) -> Result<QueryResult, DbError> {
        let builder = self
            .request(Method::DELETE, &query.table)
            .query(&query.to_pairs())
            .header("Prefer", RETURN_REPRESENTATION);
        self.rows(builder, &query.table).await
    }

    async fn upsert(&self, table: &str, rows: Vec<Row>, on_conflict: &str) -> Result<QueryResult, DbError> {
        let builder = self
            .request(Method::POST, table)
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", MERGE_DUPLICATES)
            .json(&rows);
        self.rows(builder, table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_url() {
        let store = RestStore::new(FetchClient::new("https://example.test").with_api_key("anon"));
        let query = Query::table("promocodes").eq("code", "SAVE10").eq("is_active", true);
        let request = store
            .request(Method::GET, &query.table)
            .query(&[("select", "*")])
            .query(&query.to_pairs())
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://example.test/rest/v1/promocodes?select=*&code=eq.SAVE10&is_active=eq.true"
        );
        assert_eq!(request.headers()["apikey"], "anon");
    }

    #[test]
    fn test_update_url_carries_guard() {
        let store = RestStore::new(FetchClient::new("https://example.test"));
        let query = Query::table("promocodes").eq("id", "p1").eq("used_count", 3);
        let request = store
            .request(Method::PATCH, &query.table)
            .query(&query.to_pairs())
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::PATCH);
        assert_eq!(request.url().query(), Some("id=eq.p1&used_count=eq.3"));
    }
}
