//! Duplex Connection - transport-negotiating connection for real-time messaging.
//!
//! This library opens one logical connection to a server endpoint and
//! carries an opaque payload stream over the best transport both sides
//! support, behind a uniform start/send/stop surface.
//!
//! # Architecture
//!
//! The connection follows a negotiate-then-connect model:
//!
//! - **Negotiation**: one `OPTIONS` exchange returns a connection id and the
//!   server's transports in priority order
//! - **Selection**: the caller's preference (or the server's order) picks a
//!   transport kind; a caller-built transport bypasses the list
//! - **Connect**: the transport connects to the target url carrying the id
//!
//! Key design principles:
//!
//! - At most one live transport per [`Connection`]
//! - `Disconnected` is terminal; create a new connection to reconnect
//! - `stop` waits for an outstanding `start` instead of racing it
//! - Auth redirects go to an injected callback, never to ambient globals
//!
//! # Quick Start
//!
//! ```no_run
//! use duplex_connection::{Connection, Payload, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let connection = Connection::builder("http://localhost:5000/chat")
//!         .on_unauthorized(|location| eprintln!("sign in at {location}"))
//!         .build()?;
//!
//!     connection.on_receive(|payload| println!("received: {payload:?}"));
//!     connection.on_close(|error| println!("closed: {error:?}"));
//!
//!     connection.start().await?;
//!     connection.send(Payload::text("hello")).await?;
//!     connection.stop().await;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connection`] | [`Connection`], builder, options, lifecycle |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`http`] | Negotiation HTTP client |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Negotiation response and payload types |
//! | [`transport`] | Transport contract, selection and WebSocket driver |
//!
//! # Logging
//!
//! Events are emitted with `tracing` under the `duplex_connection` target,
//! inside a `connection` span carrying the url and connection id. Filter
//! them in the subscriber, e.g. `RUST_LOG=duplex_connection=debug`.

// ============================================================================
// Modules
// ============================================================================

/// Connection lifecycle.
///
/// - [`Connection`] - The orchestrator
/// - [`ConnectionBuilder`] - Fluent configuration
/// - [`ConnectionState`] - Lifecycle state
pub mod connection;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// HTTP client used for negotiation.
pub mod http;

/// Type-safe identifiers.
pub mod identifiers;

/// Wire-level value types.
pub mod protocol;

/// Transport contract and drivers.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Connection types
pub use connection::{
    Connection, ConnectionBuilder, ConnectionOptions, ConnectionState, Redirect,
};

// Error types
pub use error::{Error, Result};

// HTTP types
pub use http::{HttpClient, HttpResponse, ReqwestHttpClient};

// Identifier types
pub use identifiers::ConnectionId;

// Protocol types
pub use protocol::{NegotiateResponse, Payload, TransferFormat};

// Transport types
pub use transport::{
    Transport, TransportChoice, TransportFactory, TransportHandlers, TransportKind,
    TransportRegistry, WebSocketTransport,
};
