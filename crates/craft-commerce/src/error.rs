//! Commerce error types.

use craft_data::TimeoutError;
use thiserror::Error;

use crate::checkout::FieldErrors;

/// Errors that can occur in storefront operations.
///
/// Promocode rule rejections are not errors; they come back inside
/// [`crate::cart::PromocodeOutcome`].
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Shipping region not found among the loaded regions.
    #[error("Shipping region not found: {0}")]
    RegionNotFound(String),

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Quantity exceeds maximum allowed.
    #[error("Quantity {0} exceeds maximum allowed ({1})")]
    QuantityExceedsLimit(i64, i64),

    /// Checkout with nothing in the cart.
    #[error("Your cart is empty")]
    EmptyCart,

    /// Checkout submitted without a shipping region.
    #[error("Please select a shipping region")]
    RegionNotSelected,

    /// Invalid checkout state transition.
    #[error("Invalid checkout transition from {from} to {to}")]
    InvalidCheckoutTransition { from: String, to: String },

    /// Checkout form has missing or malformed fields.
    #[error("Please fill in all required fields")]
    Validation(FieldErrors),

    /// A backend row failed validation at the data-access boundary.
    #[error("Invalid {table} record: {reason}")]
    InvalidRecord { table: &'static str, reason: String },

    /// A remote step exceeded its time bound.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// Database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Cache error.
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CommerceError {
    /// Check if the user can retry the action that failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CommerceError::Timeout(_) | CommerceError::DatabaseError(_))
    }

    /// Per-field messages when this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            CommerceError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<craft_db::DbError> for CommerceError {
    fn from(e: craft_db::DbError) -> Self {
        match e {
            craft_db::DbError::Timeout(t) => CommerceError::Timeout(t),
            other => CommerceError::DatabaseError(other.to_string()),
        }
    }
}

impl From<craft_cache::CacheError> for CommerceError {
    fn from(e: craft_cache::CacheError) -> Self {
        CommerceError::CacheError(e.to_string())
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::SerializationError(e.to_string())
    }
}
