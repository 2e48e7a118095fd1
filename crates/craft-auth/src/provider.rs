//! The auth provider seam.

use async_trait::async_trait;

use crate::session::{AuthSession, SignUpResult};
use crate::AuthError;

/// Remote authentication service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange an email and password for a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Create an account.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult, AuthError>;

    /// Revoke a session on the provider.
    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError>;
}
