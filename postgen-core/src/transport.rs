//! # transport: the HTTP capability consumed by the inference adapters
//!
//! Adapters never talk to `reqwest` directly. They post a JSON body to a model
//! endpoint through [`InferenceTransport`] and interpret the returned status and
//! payload themselves, so a non-success status is a [`TransportResponse`], not a
//! [`TransportError`]. Only failures to get a response at all are errors.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, so tests can script responses and
//!   assert that no request was sent.
//! - [`HttpTransport`] is exercised against `wiremock` in the integration tests.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::InferenceConfig;

/// A response from a model endpoint, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Builds a response with the canonical reason phrase for `status`.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Posts JSON to an inference endpoint.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value)
        -> Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport that authenticates with the configured bearer token.
pub struct HttpTransport {
    client: Client,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &InferenceConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                error!(error = ?e, "Failed to build HTTP client");
                TransportError::Request(e.to_string())
            })?;
        debug!(
            timeout_secs = config.timeout_secs,
            api_key_set = config.is_configured(),
            "Initialised HTTP transport"
        );
        Ok(Self {
            client,
            api_key: config.credential().map(str::to_owned),
        })
    }
}

#[async_trait]
impl InferenceTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = ?e, url = %url, "Inference request failed");
            TransportError::Request(e.to_string())
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await.map_err(|e| {
            error!(error = ?e, url = %url, status = %status, "Failed to read inference response body");
            TransportError::Body(e.to_string())
        })?;

        debug!(url = %url, status = %status, bytes = body.len(), "Inference response received");
        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            body: body.to_vec(),
        })
    }
}
