//! Session types.

use chrono::{DateTime, Utc};
use craft_cache::cache_key;
use craft_commerce::ids::UserId;
use serde::{Deserialize, Serialize};

/// The signed-in user as reported by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    pub fn new(id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
            email_confirmed_at: None,
            created_at: None,
        }
    }

    /// Check if the email address was confirmed.
    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }

    /// Email, or an empty string when the provider did not return one.
    pub fn email_or_default(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }
}

/// An authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthSession {
    /// Bearer token for backend requests.
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Unix timestamp when the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthSession {
    pub fn new(access_token: impl Into<String>, user: AuthUser) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: default_token_type(),
            expires_at: None,
            user,
        }
    }

    /// Set the expiry timestamp.
    pub fn with_expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    /// Check if the access token has expired at `now`.
    ///
    /// A session without an expiry never expires locally.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now.timestamp() >= at)
    }

    /// Check if the access token has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Get the cache key the session is persisted under.
    pub fn cache_key() -> String {
        cache_key!("auth", "session")
    }
}

/// What a sign-up produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpResult {
    pub user: AuthUser,
    /// `None` when the provider requires email confirmation first.
    pub session: Option<AuthSession>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_from_token_response() {
        let session: AuthSession = serde_json::from_value(serde_json::json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1_718_003_600,
            "refresh_token": "r1",
            "user": {
                "id": "8f3c2a4e-0000-4000-8000-000000000001",
                "email": "mona@example.com",
                "email_confirmed_at": "2024-06-01T10:00:00Z",
                "aud": "authenticated"
            }
        }))
        .unwrap();

        assert_eq!(session.access_token, "jwt");
        assert_eq!(session.user.email_or_default(), "mona@example.com");
        assert!(session.user.is_confirmed());

        let before = Utc.timestamp_opt(1_718_003_599, 0).unwrap();
        let after = Utc.timestamp_opt(1_718_003_600, 0).unwrap();
        assert!(!session.is_expired_at(before));
        assert!(session.is_expired_at(after));
    }

    #[test]
    fn test_session_without_expiry() {
        let session = AuthSession::new("jwt", AuthUser::new("u1", "a@b.co"));
        assert!(!session.is_expired());
        assert_eq!(AuthSession::cache_key(), "auth:session");
    }
}
