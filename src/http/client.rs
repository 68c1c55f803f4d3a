//! Default negotiation client backed by reqwest.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};

use super::{HttpClient, HttpResponse};

// ============================================================================
// ReqwestHttpClient
// ============================================================================

/// [`HttpClient`] over a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    /// Pooled client.
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a client with reqwest defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing reqwest client.
    #[inline]
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn options(&self, url: &Url) -> Result<HttpResponse> {
        let response = self
            .client
            .request(Method::OPTIONS, url.as_str())
            .send()
            .await
            .map_err(|e| Error::negotiation(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::negotiation(e.to_string()))?;

        trace!(%url, status, len = body.len(), "OPTIONS completed");

        Ok(HttpResponse::new(status, body))
    }
}

// ============================================================================
// Tests
// ============================================================================
