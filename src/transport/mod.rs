//! Transport layer.
//!
//! A transport carries payloads between client and server. The connection
//! only depends on the [`Transport`] contract; concrete drivers are created
//! through a [`TransportFactory`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  select   ┌──────────────────┐  create  ┌──────────────────┐
//! │  Connection  │──────────►│ select_transport │─────────►│ TransportFactory │
//! │              │           └──────────────────┘          └────────┬─────────┘
//! │              │◄── on_receive / on_close ──┐                     │
//! │              │─── connect / send / stop ──┴─────────► Arc<dyn Transport>
//! └──────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `factory` | Registry of transport constructors |
//! | `kind` | Built-in transport kinds |
//! | `selector` | Preferred/advertised selection policy |
//! | `websocket` | WebSocket driver |

// ============================================================================
// Submodules
// ============================================================================

/// Registry of transport constructors.
pub mod factory;

/// Built-in transport kinds.
pub mod kind;

/// Transport selection policy.
pub mod selector;

/// WebSocket transport driver.
pub mod websocket;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{Payload, TransferFormat};

// ============================================================================
// Re-exports
// ============================================================================

pub use factory::{TransportConstructor, TransportFactory, TransportRegistry};
pub use kind::TransportKind;
pub use selector::{SelectedTransport, TransportChoice, choose_kind, select_transport};
pub use websocket::WebSocketTransport;

// ============================================================================
// Types
// ============================================================================

/// Callback invoked for each inbound payload.
pub type ReceiveHandler = Arc<dyn Fn(Payload) + Send + Sync>;

/// Callback invoked once when the transport closes on its own.
pub type CloseHandler = Arc<dyn Fn(Option<Error>) + Send + Sync>;

// ============================================================================
// TransportHandlers
// ============================================================================

/// The two callback slots a transport reports through.
#[derive(Clone, Default)]
pub struct TransportHandlers {
    /// Data-received slot.
    pub on_receive: Option<ReceiveHandler>,
    /// Closed slot.
    pub on_close: Option<CloseHandler>,
}

impl TransportHandlers {
    /// Creates handlers with both slots filled.
    pub fn new(
        on_receive: impl Fn(Payload) + Send + Sync + 'static,
        on_close: impl Fn(Option<Error>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_receive: Some(Arc::new(on_receive)),
            on_close: Some(Arc::new(on_close)),
        }
    }

    /// Delivers an inbound payload.
    pub fn receive(&self, payload: Payload) {
        if let Some(handler) = &self.on_receive {
            handler(payload);
        }
    }

    /// Reports that the transport closed.
    pub fn close(&self, error: Option<Error>) {
        if let Some(handler) = &self.on_close {
            handler(error);
        }
    }
}

impl fmt::Debug for TransportHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHandlers")
            .field("on_receive", &self.on_receive.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

// ============================================================================
// Transport
// ============================================================================

/// The capability every transport driver provides.
///
/// Handlers are installed before `connect`. A transport must not invoke
/// `on_close` for a stop the client requested.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        "Custom"
    }

    /// Replaces the callback slots.
    fn set_handlers(&self, handlers: TransportHandlers);

    /// Connects to `url`, returning the transfer format actually granted.
    async fn connect(&self, url: &Url, requested: TransferFormat) -> Result<TransferFormat>;

    /// Sends one payload.
    async fn send(&self, payload: Payload) -> Result<()>;

    /// Closes the transport.
    async fn stop(&self) -> Result<()>;
}
