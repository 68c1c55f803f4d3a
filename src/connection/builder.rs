//! Builder pattern for connection configuration.
//!
//! # Example
//!
//! ```no_run
//! use duplex_connection::{Connection, TransportKind};
//!
//! # fn example() -> duplex_connection::Result<()> {
//! let connection = Connection::builder("https://chat.example.com/hub")
//!     .transport(TransportKind::WebSockets)
//!     .on_unauthorized(|location| eprintln!("sign in at {location}"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::protocol::TransferFormat;
use crate::transport::{Transport, TransportChoice, TransportFactory, TransportKind};

use super::core::Connection;
use super::options::ConnectionOptions;
use super::target::resolve_url;

// ============================================================================
// ConnectionBuilder
// ============================================================================

/// Builder for configuring a [`Connection`].
///
/// Use [`Connection::builder()`] to create a new builder.
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    /// Caller-supplied url, absolute or relative.
    url: String,
    /// Options collected so far.
    options: ConnectionOptions,
}

// ============================================================================
// ConnectionBuilder Implementation
// ============================================================================

impl ConnectionBuilder {
    /// Creates a builder for `url` with default options.
    #[inline]
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            options: ConnectionOptions::new(),
        }
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Requests a transport kind. Used only if the server offers it.
    #[inline]
    #[must_use]
    pub fn transport(mut self, kind: TransportKind) -> Self {
        self.options = self.options.with_transport(kind);
        self
    }

    /// Uses a caller-built transport regardless of what the server offers.
    #[inline]
    #[must_use]
    pub fn custom_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.options = self
            .options
            .with_transport(TransportChoice::Custom(transport));
        self
    }

    /// Sets the negotiation client.
    #[inline]
    #[must_use]
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.options = self.options.with_http_client(client);
        self
    }

    /// Sets the transport factory.
    #[inline]
    #[must_use]
    pub fn transport_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.options = self.options.with_transport_factory(factory);
        self
    }

    /// Sets the callback receiving auth redirect locations.
    #[inline]
    #[must_use]
    pub fn on_unauthorized(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.options = self.options.with_on_unauthorized(handler);
        self
    }

    /// Sets the origin used to resolve a relative url.
    #[inline]
    #[must_use]
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.options = self.options.with_base_url(base_url);
        self
    }

    /// Sets the requested transfer format.
    #[inline]
    #[must_use]
    pub fn transfer_format(mut self, format: TransferFormat) -> Self {
        self.options = self.options.with_transfer_format(format);
        self
    }

    /// Connects a WebSocket directly without negotiating.
    #[inline]
    #[must_use]
    pub fn skip_negotiation(mut self) -> Self {
        self.options = self.options.with_skip_negotiation();
        self
    }

    /// Sets the negotiation and connect timeout.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_connect_timeout(timeout);
        self
    }

    /// Builds the connection with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are inconsistent
    /// - [`Error::UnresolvableUrl`] if the url is relative and no base url is set
    /// - [`Error::Url`] if the url is invalid
    pub fn build(self) -> Result<Connection> {
        self.options.validate().map_err(Error::config)?;

        let url = resolve_url(&self.url, self.options.base_url.as_ref())?;

        let http_client: Arc<dyn HttpClient> = match &self.options.http_client {
            Some(client) => Arc::clone(client),
            None => Arc::new(ReqwestHttpClient::new()?),
        };

        Ok(Connection::new(url, self.options, http_client))
    }
}

// ============================================================================
// Tests
// ============================================================================
