//! Connection lifecycle.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Connection`] | Orchestrates negotiation, selection and connect |
//! | [`ConnectionBuilder`] | Fluent configuration builder |
//! | [`ConnectionOptions`] | Connection configuration |
//! | [`ConnectionState`] | Lifecycle state |
//! | [`Negotiator`] | Negotiation exchange |
//! | [`Redirect`] | Redirect extracted from a close reason |
//!
//! # Data Flow
//!
//! ```text
//! start ─► Negotiator ─► select_transport ─► Transport::connect ─► Connected
//!                                                  │
//!            on_close(error) ◄── parse_redirect ◄──┘ (transport closes)
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for connection configuration.
pub mod builder;

/// Core connection implementation.
pub mod core;

/// Negotiation exchange.
pub mod negotiator;

/// Connection options.
pub mod options;

/// Redirect-coded close reasons.
pub mod redirect;

/// Lifecycle states.
pub mod state;

/// Target url resolution.
pub mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ConnectionBuilder;
pub use self::core::{CloseCallback, Connection, ReceiveCallback};
pub use negotiator::Negotiator;
pub use options::{ConnectionOptions, DEFAULT_CONNECT_TIMEOUT, RedirectHandler};
pub use redirect::{Redirect, parse_redirect};
pub use state::ConnectionState;
pub use target::{resolve_url, with_connection_id};
