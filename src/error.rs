//! Error types for duplex connections.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use duplex_connection::{Connection, Payload, Result};
//!
//! async fn example(connection: &Connection) -> Result<()> {
//!     connection.start().await?;
//!     connection.send(Payload::text("hello")).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | State | [`Error::InvalidState`], [`Error::ConnectionStopped`] |
//! | Configuration | [`Error::Config`], [`Error::UnresolvableUrl`] |
//! | Negotiation | [`Error::Negotiation`], [`Error::Http`], [`Error::Unauthorized`], [`Error::Forbidden`] |
//! | Transport | [`Error::NoAvailableTransport`], [`Error::TransportConnect`], [`Error::TransportClosed`], [`Error::ConnectionClosed`] |
//! | External | [`Error::Url`], [`Error::Json`], [`Error::WebSocket`], [`Error::Io`], [`Error::ChannelClosed`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::connection::ConnectionState;
use crate::transport::TransportKind;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // State Errors
    // ========================================================================
    /// Operation not allowed in the current connection state.
    ///
    /// Returned when `start` is called twice or `send` is called while
    /// the connection is not connected.
    #[error("Cannot {operation} a connection in the {state} state")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// State the connection was in.
        state: ConnectionState,
    },

    /// The start sequence was aborted by a concurrent stop.
    #[error("Connection was stopped before it finished connecting")]
    ConnectionStopped,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when connection options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Relative URL with no base origin to resolve it against.
    #[error("Cannot resolve relative url '{url}' without a base url")]
    UnresolvableUrl {
        /// The caller-supplied url.
        url: String,
    },

    // ========================================================================
    // Negotiation Errors
    // ========================================================================
    /// Negotiation failed (network, parse, or server rejection).
    #[error("Negotiation failed: {message}")]
    Negotiation {
        /// Description of the negotiation failure.
        message: String,
    },

    /// Non-success HTTP status from the negotiation client.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// Server rejected the connection as unauthenticated.
    ///
    /// Carries the redirect location or server message.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Redirect location or server-supplied message.
        message: String,
    },

    /// Server rejected the connection as not permitted.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Redirect location or server-supplied message.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// No transport satisfies both the caller and the server.
    #[error("No available transport: {message}")]
    NoAvailableTransport {
        /// Why selection failed.
        message: String,
    },

    /// The selected transport failed to connect.
    #[error("{transport} transport failed to connect: {message}")]
    TransportConnect {
        /// Name of the transport that failed.
        transport: String,
        /// Description of the connect failure.
        message: String,
    },

    /// Transport closed by the remote end with a close frame.
    #[error("Transport closed ({code}): {reason}")]
    TransportClosed {
        /// Close status code.
        code: u16,
        /// Close reason text.
        reason: String,
    },

    /// Connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(operation: &'static str, state: ConnectionState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an unresolvable url error.
    #[inline]
    pub fn unresolvable_url(url: impl Into<String>) -> Self {
        Self::UnresolvableUrl { url: url.into() }
    }

    /// Creates a negotiation error.
    #[inline]
    pub fn negotiation(message: impl Into<String>) -> Self {
        Self::Negotiation {
            message: message.into(),
        }
    }

    /// Creates an HTTP status error.
    #[inline]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates an unauthorized error.
    #[inline]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    #[inline]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a no available transport error.
    #[inline]
    pub fn no_available_transport(message: impl Into<String>) -> Self {
        Self::NoAvailableTransport {
            message: message.into(),
        }
    }

    /// Creates a transport connect error.
    #[inline]
    pub fn transport_connect(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportConnect {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Creates a transport connect error for a known transport kind.
    #[inline]
    pub fn connect_failed(kind: TransportKind, message: impl Into<String>) -> Self {
        Self::transport_connect(kind.as_str(), message)
    }

    /// Creates a transport closed error.
    #[inline]
    pub fn transport_closed(code: u16, reason: impl Into<String>) -> Self {
        Self::TransportClosed {
            code,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error carries an auth redirect.
    #[inline]
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::Forbidden { .. })
    }

    /// Returns `true` if this error came from negotiation.
    #[inline]
    #[must_use]
    pub fn is_negotiation_error(&self) -> bool {
        matches!(
            self,
            Self::Negotiation { .. }
                | Self::Http { .. }
                | Self::Unauthorized { .. }
                | Self::Forbidden { .. }
        )
    }

    /// Returns `true` if this is a transport error.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::NoAvailableTransport { .. }
                | Self::TransportConnect { .. }
                | Self::TransportClosed { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns the textual reason of a remote close, if any.
    #[inline]
    #[must_use]
    pub fn close_reason(&self) -> Option<&str> {
        match self {
            Self::TransportClosed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
