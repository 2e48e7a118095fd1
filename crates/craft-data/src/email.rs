//! Client for the transactional email edge function.
//!
//! The function accepts `POST { orderData, type }` and answers
//! `{ success, messageId, sentTo, type }`, or `{ success: false, error }`
//! with a 4xx status. `GET` on the same path returns a health payload.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::{FetchClient, FetchError};
use crate::step::RemoteStep;

/// Default path of the email function under the backend URL.
pub const DEFAULT_EMAIL_FUNCTION_PATH: &str = "functions/v1/send-email";

/// Which message of an order to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailKind {
    /// Order confirmation to the customer.
    Customer,
    /// New-order notification to the shop owner.
    Owner,
}

impl EmailKind {
    /// Get the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Owner => "owner",
        }
    }
}

impl std::fmt::Display for EmailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailReceipt {
    /// Provider message id.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Recipient address.
    #[serde(default)]
    pub sent_to: Option<String>,
    /// Kind echoed back by the function.
    #[serde(rename = "type", default)]
    pub kind: Option<EmailKind>,
}

/// Health payload returned by `GET`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailServiceStatus {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub resend_key_configured: bool,
    #[serde(default)]
    pub owner_email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a, T: Serialize> {
    order_data: &'a T,
    #[serde(rename = "type")]
    kind: EmailKind,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    receipt: EmailReceipt,
}

/// Error from the email function.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// The function answered but refused to send.
    #[error("Email rejected: {0}")]
    Rejected(String),

    /// The function could not be reached or timed out.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl From<crate::TimeoutError> for EmailError {
    fn from(e: crate::TimeoutError) -> Self {
        EmailError::Fetch(FetchError::Timeout(e))
    }
}

impl EmailError {
    /// Check if the send timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EmailError::Fetch(e) if e.is_timeout())
    }
}

/// HTTP client for the email function.
#[derive(Debug, Clone)]
pub struct EmailFunctionClient {
    client: FetchClient,
    path: String,
}

impl EmailFunctionClient {
    /// Create a client for the function at `path` under the backend URL.
    pub fn new(client: FetchClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }

    /// Full URL of the function.
    pub fn endpoint(&self) -> String {
        self.client.url(&self.path)
    }

    /// Send one message for an order.
    pub async fn send<T: Serialize>(&self, order_data: &T, kind: EmailKind) -> Result<EmailReceipt, EmailError> {
        let body = SendRequest { order_data, kind };
        let builder = self.client.request(Method::POST, &self.path).json(&body);

        let response: SendResponse = match self.client.send_json(RemoteStep::Email, builder).await {
            Ok(response) => response,
            Err(FetchError::Http { body, status, .. }) => {
                return Err(EmailError::Rejected(rejection_message(&body, status)));
            }
            Err(e) => return Err(e.into()),
        };

        if !response.success {
            let message = response.error.unwrap_or_else(|| "Failed to send email".to_string());
            return Err(EmailError::Rejected(message));
        }

        tracing::info!(
            kind = %kind,
            message_id = response.receipt.message_id.as_deref().unwrap_or(""),
            "email sent"
        );
        Ok(response.receipt)
    }

    /// Query the function's health endpoint.
    pub async fn status(&self) -> Result<EmailServiceStatus, FetchError> {
        self.client.get_json(&self.path, RemoteStep::Email).await
    }
}

fn rejection_message(body: &str, status: u16) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status))
}
