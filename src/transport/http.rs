//! Request/response primitive for the HTTP steps of the handshake.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Per-request timeout for the default client.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// HttpResponse
// ============================================================================

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response.
    #[inline]
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for status 200.
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// Issues the GET requests used by negotiate and start.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Performs a GET request.
    ///
    /// Non-success statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns an error only if no response was received.
    async fn get(&self, url: &Url) -> Result<HttpResponse>;
}

// ============================================================================
// ReqwestClient
// ============================================================================

/// Default [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the default request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Wraps an existing `reqwest` client.
    #[inline]
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::http(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        trace!(%url, status, "HTTP GET complete");

        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// Tests
// ============================================================================
