//! Negotiation exchange.
//!
//! One `OPTIONS` request against the target url yields the connection id and
//! the server's transports. Auth rejections keep their own error kinds so the
//! connection can forward them to the redirect callback.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpResponse};
use crate::protocol::NegotiateResponse;

// ============================================================================
// Constants
// ============================================================================

/// HTTP status for an unauthenticated request.
const STATUS_UNAUTHORIZED: u16 = 401;

/// HTTP status for a forbidden request.
const STATUS_FORBIDDEN: u16 = 403;

// ============================================================================
// Negotiator
// ============================================================================

/// Performs the negotiation exchange.
#[derive(Clone)]
pub struct Negotiator {
    /// Client for the exchange.
    client: Arc<dyn HttpClient>,
    /// Upper bound for the exchange.
    timeout: Duration,
}

impl Negotiator {
    /// Creates a negotiator.
    #[inline]
    #[must_use]
    pub fn new(client: Arc<dyn HttpClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Negotiates with the server at `url`.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] on 401, carrying the server message
    /// - [`Error::Forbidden`] on 403, carrying the server message
    /// - [`Error::Negotiation`] on any other failure or timeout
    pub async fn negotiate(&self, url: &Url) -> Result<NegotiateResponse> {
        debug!(%url, "Negotiating");

        let response = timeout(self.timeout, self.client.options(url))
            .await
            .map_err(|_| {
                Error::negotiation(format!("timed out after {}ms", self.timeout.as_millis()))
            })?
            .map_err(Self::classify)?;

        let negotiated = Self::interpret(response)?;

        debug!(
            connection_id = %negotiated.connection_id,
            transports = ?negotiated.available_transports,
            "Negotiation completed"
        );

        Ok(negotiated)
    }

    /// Maps a response to a negotiation outcome.
    fn interpret(response: HttpResponse) -> Result<NegotiateResponse> {
        if !response.is_success() {
            return Err(Self::classify(Error::http(response.status, response.body)));
        }

        NegotiateResponse::from_json(&response.body)
            .map_err(|e| Error::negotiation(format!("invalid negotiate response: {e}")))
    }

    /// Normalizes client errors into negotiation errors.
    fn classify(err: Error) -> Error {
        match err {
            Error::Http {
                status: STATUS_UNAUTHORIZED,
                message,
            } => Error::unauthorized(message),
            Error::Http {
                status: STATUS_FORBIDDEN,
                message,
            } => Error::forbidden(message),
            Error::Http { status, message } => {
                Error::negotiation(format!("server responded with {status}: {message}"))
            }
            err if err.is_negotiation_error() => err,
            err => Error::negotiation(err.to_string()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
