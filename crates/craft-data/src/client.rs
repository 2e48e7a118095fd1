//! JSON-over-HTTP client for the hosted backend.

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::step::RemoteStep;
use crate::timeout::{TimeoutConfig, TimeoutError};

/// Error type for fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {status} for {url}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Request error: {0}")]
    Request(String),
}

impl FetchError {
    /// Check if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// HTTP status of the failed response, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            FetchError::Connection(e.to_string())
        } else if e.is_decode() {
            FetchError::Deserialization(e.to_string())
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

/// Client for the hosted backend.
///
/// Every request carries the project key and, once signed in, the user's
/// access token. Each call is bounded by the timeout of the step it serves.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    bearer: Option<String>,
    timeouts: TimeoutConfig,
}

impl FetchClient {
    /// Create a new client for a backend base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            bearer: None,
            timeouts: TimeoutConfig::default(),
        }
    }

    /// Set the project API key sent with every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the user access token sent as a bearer token.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Set the timeout configuration.
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Get the timeout configuration.
    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// Get the backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a path against the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request with the backend headers applied.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));

        if let Some(ref key) = self.api_key {
            builder = builder.header("apikey", key);
        }
        match (&self.bearer, &self.api_key) {
            (Some(token), _) | (None, Some(token)) => builder = builder.bearer_auth(token),
            (None, None) => {}
        }

        builder
    }

    /// Send a request and decode the JSON response, bounded by the step's timeout.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        step: RemoteStep,
        builder: RequestBuilder,
    ) -> Result<T, FetchError> {
        self.timeouts.run(step, execute_json(builder)).await
    }

    /// Send a request whose response body is ignored, bounded by the step's timeout.
    pub async fn send_empty(&self, step: RemoteStep, builder: RequestBuilder) -> Result<(), FetchError> {
        self.timeouts.run(step, execute_empty(builder)).await
    }

    /// GET a path and decode the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, step: RemoteStep) -> Result<T, FetchError> {
        tracing::debug!(step = %step, path, "GET");
        self.send_json(step, self.request(Method::GET, path)).await
    }

    /// POST a JSON body to a path and decode the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B, step: RemoteStep) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(step = %step, path, "POST");
        self.send_json(step, self.request(Method::POST, path).json(body))
            .await
    }
}

/// Send a request and decode the JSON response.
///
/// No time bound is applied here; callers that own a step bound wrap this.
pub async fn execute_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, FetchError> {
    let response = check_status(builder.send().await?).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| FetchError::Deserialization(e.to_string()))
}

/// Send a request and discard the response body.
pub async fn execute_empty(builder: RequestBuilder) -> Result<(), FetchError> {
    check_status(builder.send().await?).await?;
    Ok(())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(FetchError::Http {
        status: status.as_u16(),
        url,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_url_joining() {
        let client = FetchClient::new("https://example.supabase.co/");
        assert_eq!(client.base_url(), "https://example.supabase.co");
        assert_eq!(
            client.url("/rest/v1/products"),
            "https://example.supabase.co/rest/v1/products"
        );
        assert_eq!(
            client.url("functions/v1/send-email"),
            "https://example.supabase.co/functions/v1/send-email"
        );
    }

    #[test]
    fn test_request_headers() {
        let client = FetchClient::new("https://example.test").with_api_key("anon");
        let request = client.request(Method::GET, "rest/v1/products").build().unwrap();
        assert_eq!(request.headers()["apikey"], "anon");
        assert_eq!(request.headers()["authorization"], "Bearer anon");

        let client = client.with_bearer("user-token");
        let request = client.request(Method::GET, "rest/v1/orders").build().unwrap();
        assert_eq!(request.headers()["authorization"], "Bearer user-token");
    }

    #[test]
    fn test_with_timeouts() {
        let client = FetchClient::new("https://example.test")
            .with_timeouts(TimeoutConfig::uniform(Duration::from_millis(250)));
        assert_eq!(
            client.timeouts().for_step(RemoteStep::Email),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_error_accessors() {
        let err = FetchError::Http {
            status: 404,
            url: "https://example.test/x".into(),
            body: String::new(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_timeout());

        let err = FetchError::from(TimeoutError {
            step: RemoteStep::Catalog,
            limit: Duration::from_secs(3),
        });
        assert!(err.is_timeout());
        assert_eq!(err.status(), None);
    }
}
