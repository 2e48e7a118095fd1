//! Auth provider over the hosted backend's auth HTTP API.

use async_trait::async_trait;
use craft_data::{FetchClient, RemoteStep};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::provider::AuthProvider;
use crate::session::{AuthSession, AuthUser, SignUpResult};
use crate::AuthError;

const TOKEN_PATH: &str = "auth/v1/token?grant_type=password";
const SIGNUP_PATH: &str = "auth/v1/signup";
const LOGOUT_PATH: &str = "auth/v1/logout";

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Sign-up answers with a session when accounts are auto-confirmed and
/// with the bare user otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(AuthSession),
    User(AuthUser),
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn text(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

/// Map an error response of the auth API to an [`AuthError`].
pub(crate) fn classify(status: u16, body: &str) -> AuthError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::text)
        .unwrap_or_else(|| body.to_string());
    let lower = message.to_ascii_lowercase();

    if lower.contains("invalid login credentials") || lower.contains("invalid_grant") {
        AuthError::InvalidCredentials
    } else if lower.contains("already registered") || lower.contains("already exists") {
        AuthError::UserAlreadyExists(message)
    } else if lower.contains("email not confirmed") {
        AuthError::EmailNotConfirmed
    } else if lower.contains("password") && (status == 400 || status == 422) {
        AuthError::WeakPassword(message)
    } else if lower.contains("email") && (status == 400 || status == 422) {
        AuthError::InvalidEmail(message)
    } else {
        AuthError::Provider { status, message }
    }
}

/// [`AuthProvider`] backed by the hosted auth API.
#[derive(Debug, Clone)]
pub struct HttpAuthProvider {
    client: FetchClient,
}

impl HttpAuthProvider {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &FetchClient {
        &self.client
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        tracing::debug!(email, "password sign-in");
        let request = self
            .client
            .request(Method::POST, TOKEN_PATH)
            .json(&Credentials { email, password });
        Ok(self.client.send_json(RemoteStep::SignIn, request).await?)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult, AuthError> {
        tracing::debug!(email, "sign-up");
        let request = self
            .client
            .request(Method::POST, SIGNUP_PATH)
            .json(&Credentials { email, password });
        let response: SignUpResponse = self.client.send_json(RemoteStep::SignUp, request).await?;

        Ok(match response {
            SignUpResponse::Session(session) => SignUpResult {
                user: session.user.clone(),
                session: Some(session),
            },
            SignUpResponse::User(user) => SignUpResult { user, session: None },
        })
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError> {
        let client = self.client.clone().with_bearer(&session.access_token);
        let request = client.request(Method::POST, LOGOUT_PATH);
        Ok(client.send_empty(RemoteStep::SignOut, request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_errors() {
        assert!(matches!(
            classify(400, r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            classify(422, r#"{"code":422,"msg":"User already registered"}"#),
            AuthError::UserAlreadyExists(_)
        ));
        assert!(matches!(
            classify(422, r#"{"msg":"Password should be at least 6 characters"}"#),
            AuthError::WeakPassword(_)
        ));
        assert!(matches!(
            classify(400, r#"{"error_description":"Email not confirmed"}"#),
            AuthError::EmailNotConfirmed
        ));
        assert!(matches!(
            classify(503, "upstream unavailable"),
            AuthError::Provider { status: 503, .. }
        ));
    }

    #[test]
    fn test_sign_up_response_shapes() {
        let with_session: SignUpResponse = serde_json::from_value(serde_json::json!({
            "access_token": "jwt",
            "user": {"id": "u1", "email": "a@b.co"}
        }))
        .unwrap();
        assert!(matches!(with_session, SignUpResponse::Session(_)));

        let bare: SignUpResponse = serde_json::from_value(serde_json::json!({
            "id": "u2",
            "email": "c@d.co",
            "confirmation_sent_at": "2024-06-01T10:00:00Z"
        }))
        .unwrap();
        assert!(matches!(bare, SignUpResponse::User(u) if u.id.as_str() == "u2"));
    }

    #[test]
    fn test_timeout_maps_through() {
        let err = AuthError::from(craft_data::FetchError::Timeout(craft_data::TimeoutError {
            step: RemoteStep::SignIn,
            limit: std::time::Duration::from_secs(3),
        }));
        assert!(err.is_timeout());
    }
}
