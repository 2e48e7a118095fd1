//! Database error types.

use craft_data::{FetchError, TimeoutError};
use thiserror::Error;

/// Errors that can occur when using a table store.
#[derive(Error, Debug)]
pub enum DbError {
    /// The backend could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The backend rejected or failed a query.
    #[error("Query execution failed: {0}")]
    QueryError(String),

    /// Failed to deserialize a row.
    #[error("Deserialization error: {0}")]
    DeserializeError(String),

    /// Type conversion error.
    #[error("Type conversion error: {0}")]
    TypeError(String),

    /// No rows returned when one was expected.
    #[error("No rows returned")]
    NotFound,

    /// The operation exceeded its time bound.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
}

impl DbError {
    /// Check if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DbError::Timeout(_))
    }
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::DeserializeError(e.to_string())
    }
}

impl From<FetchError> for DbError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Timeout(t) => DbError::Timeout(t),
            FetchError::Http { status, body, .. } => {
                DbError::QueryError(format!("status {}: {}", status, body))
            }
            FetchError::Connection(msg) | FetchError::Request(msg) => DbError::Connection(msg),
            FetchError::Deserialization(msg) => DbError::DeserializeError(msg),
        }
    }
}
