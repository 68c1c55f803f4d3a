//! Connection options.
//!
//! # Example
//!
//! ```ignore
//! use duplex_connection::{ConnectionOptions, TransferFormat, TransportKind};
//!
//! let options = ConnectionOptions::new()
//!     .with_transport(TransportKind::WebSockets)
//!     .with_transfer_format(TransferFormat::Binary)
//!     .with_on_unauthorized(|location| println!("sign in at {location}"));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::http::HttpClient;
use crate::protocol::TransferFormat;
use crate::transport::{TransportChoice, TransportFactory, TransportKind, TransportRegistry};

// ============================================================================
// Constants
// ============================================================================

/// Default bound for negotiation and for the transport connect.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Types
// ============================================================================

/// Receives the redirect location of an auth rejection.
pub type RedirectHandler = Arc<dyn Fn(&str) + Send + Sync>;

// ============================================================================
// ConnectionOptions
// ============================================================================

/// Configuration for a [`super::Connection`].
#[derive(Clone)]
pub struct ConnectionOptions {
    /// Preferred transport kind or a caller-built transport.
    pub transport: Option<TransportChoice>,

    /// Negotiation client. `None` uses [`crate::http::ReqwestHttpClient`].
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Constructs transports for the selected kind.
    pub transport_factory: Arc<dyn TransportFactory>,

    /// Called with the location of an auth redirect. No-op by default.
    pub on_unauthorized: RedirectHandler,

    /// Origin for relative urls.
    pub base_url: Option<Url>,

    /// Format requested from the transport.
    pub transfer_format: TransferFormat,

    /// Connect directly without negotiating. Requires WebSockets.
    pub skip_negotiation: bool,

    /// Bound for negotiation and for the transport connect.
    pub connect_timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("transport", &self.transport)
            .field("http_client", &self.http_client.is_some())
            .field("base_url", &self.base_url)
            .field("transfer_format", &self.transfer_format)
            .field("skip_negotiation", &self.skip_negotiation)
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ConnectionOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transport: None,
            http_client: None,
            transport_factory: Arc::new(TransportRegistry::with_defaults()),
            on_unauthorized: Arc::new(|_| {}),
            base_url: None,
            transfer_format: TransferFormat::Text,
            skip_negotiation: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectionOptions {
    /// Sets the preferred transport kind or a custom transport.
    #[inline]
    #[must_use]
    pub fn with_transport(mut self, transport: impl Into<TransportChoice>) -> Self {
        self.transport = Some(transport.into());
        self
    }

    /// Sets the negotiation client.
    #[inline]
    #[must_use]
    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the transport factory.
    #[inline]
    #[must_use]
    pub fn with_transport_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.transport_factory = factory;
        self
    }

    /// Sets the redirect callback.
    #[inline]
    #[must_use]
    pub fn with_on_unauthorized(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Arc::new(handler);
        self
    }

    /// Sets the origin used to resolve relative urls.
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the requested transfer format.
    #[inline]
    #[must_use]
    pub fn with_transfer_format(mut self, format: TransferFormat) -> Self {
        self.transfer_format = format;
        self
    }

    /// Skips negotiation and connects a WebSocket directly.
    #[inline]
    #[must_use]
    pub fn with_skip_negotiation(mut self) -> Self {
        self.skip_negotiation = true;
        self
    }

    /// Sets the negotiation and connect timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ConnectionOptions {
    /// Validates the options configuration.
    ///
    /// # Errors
    ///
    /// Returns error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.skip_negotiation
            && !matches!(
                self.transport,
                Some(TransportChoice::Kind(TransportKind::WebSockets))
            )
        {
            return Err(
                "Negotiation can only be skipped when the WebSockets transport is requested"
                    .to_string(),
            );
        }

        if self.connect_timeout.is_zero() {
            return Err("Connect timeout must be greater than zero".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
