//! HTTP client used for negotiation.
//!
//! The connection only needs one exchange: an `OPTIONS` request against the
//! target url. Any client that can perform it implements [`HttpClient`];
//! [`ReqwestHttpClient`] is the default.

// ============================================================================
// Submodules
// ============================================================================

/// reqwest-backed client.
pub mod client;

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::ReqwestHttpClient;

// ============================================================================
// HttpResponse
// ============================================================================

/// Status and body of an HTTP exchange.
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

    /// Returns `true` for 2xx statuses.
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// Request/response client used for negotiation.
///
/// Implementations return non-2xx responses as [`HttpResponse`] values or as
/// [`crate::Error::Http`]; both are accepted.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Performs an `OPTIONS` request.
    async fn options(&self, url: &Url) -> Result<HttpResponse>;
}

// ============================================================================
// Tests
// ============================================================================
