//! Authentication errors.

use craft_data::{FetchError, TimeoutError};
use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),

    /// Email missing or malformed.
    #[error("invalid email: {0}")]
    InvalidEmail(String),

    /// Password refused by the provider.
    #[error("password too weak: {0}")]
    WeakPassword(String),

    /// The account exists but its email is not confirmed yet.
    #[error("email not confirmed")]
    EmailNotConfirmed,

    /// The provider refused the request for another reason.
    #[error("auth provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// An auth step exceeded its time bound.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// The provider could not be reached.
    #[error("auth provider unreachable: {0}")]
    Unreachable(String),

    /// Cache error.
    #[error("cache error: {0}")]
    Cache(#[from] craft_cache::CacheError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Check if this is an authentication failure.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials | AuthError::EmailNotConfirmed
        )
    }

    /// Check if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AuthError::Timeout(_))
    }
}

impl From<FetchError> for AuthError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Timeout(t) => AuthError::Timeout(t),
            FetchError::Http { status, body, .. } => crate::http::classify(status, &body),
            FetchError::Deserialization(msg) => AuthError::Serialization(msg),
            other => AuthError::Unreachable(other.to_string()),
        }
    }
}
