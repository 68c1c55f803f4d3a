//! Negotiation response.
//!
//! # Format
//!
//! ```json
//! {
//!   "connectionId": "abc123",
//!   "availableTransports": ["WebSockets", "ServerSentEvents", "LongPolling"]
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::identifiers::ConnectionId;
use crate::transport::TransportKind;

// ============================================================================
// NegotiateResponse
// ============================================================================

/// Body of a successful negotiation exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateResponse {
    /// Id the server assigned to this connection.
    pub connection_id: ConnectionId,

    /// Transport names in the server's priority order.
    #[serde(default)]
    pub available_transports: Vec<String>,
}

impl NegotiateResponse {
    /// Parses a negotiation body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the body is not a valid response.
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Returns the advertised transports the client knows, in server order.
    ///
    /// Unknown names are skipped.
    #[must_use]
    pub fn transports(&self) -> Vec<TransportKind> {
        self.available_transports
            .iter()
            .filter_map(|name| match name.parse::<TransportKind>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    warn!(transport = %name, "Skipping unknown transport advertised by server");
                    None
                }
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
