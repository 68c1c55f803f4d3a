//! Transport construction.
//!
//! The selector only picks kinds the factory reports as constructible.
//! [`TransportRegistry::with_defaults`] knows the WebSocket driver; hosts
//! register drivers for the other kinds.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use duplex_connection::transport::{TransportKind, TransportRegistry};
//!
//! let registry = TransportRegistry::with_defaults()
//!     .register(TransportKind::LongPolling, || -> Arc<dyn Transport> {
//!         Arc::new(MyPollingTransport::new())
//!     });
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

use super::{Transport, TransportKind, WebSocketTransport};

// ============================================================================
// Types
// ============================================================================

/// Builds a fresh, unconnected transport.
pub type TransportConstructor = Arc<dyn Fn() -> Arc<dyn Transport> + Send + Sync>;

// ============================================================================
// TransportFactory
// ============================================================================

/// Creates transports by kind.
pub trait TransportFactory: Send + Sync {
    /// Returns `true` if `kind` can be constructed.
    fn supports(&self, kind: TransportKind) -> bool;

    /// Creates a new transport of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoAvailableTransport`] if `kind` is not supported.
    fn create(&self, kind: TransportKind) -> Result<Arc<dyn Transport>>;
}

// ============================================================================
// TransportRegistry
// ============================================================================

/// Map-backed [`TransportFactory`].
#[derive(Clone, Default)]
pub struct TransportRegistry {
    /// Constructors by kind.
    constructors: FxHashMap<TransportKind, TransportConstructor>,
}

impl TransportRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in WebSocket driver.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new().register(TransportKind::WebSockets, || -> Arc<dyn Transport> {
            Arc::new(WebSocketTransport::new())
        })
    }

    /// Registers (or replaces) the constructor for `kind`.
    #[must_use]
    pub fn register<F>(mut self, kind: TransportKind, constructor: F) -> Self
    where
        F: Fn() -> Arc<dyn Transport> + Send + Sync + 'static,
    {
        self.constructors.insert(kind, Arc::new(constructor));
        self
    }

    /// Returns the registered kinds in capability order.
    #[must_use]
    pub fn kinds(&self) -> Vec<TransportKind> {
        TransportKind::ALL
            .into_iter()
            .filter(|kind| self.constructors.contains_key(kind))
            .collect()
    }
}

impl TransportFactory for TransportRegistry {
    fn supports(&self, kind: TransportKind) -> bool {
        self.constructors.contains_key(&kind)
    }

    fn create(&self, kind: TransportKind) -> Result<Arc<dyn Transport>> {
        let constructor = self.constructors.get(&kind).ok_or_else(|| {
            Error::no_available_transport(format!("{kind} transport is not constructible"))
        })?;
        Ok(constructor())
    }
}

impl fmt::Debug for TransportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
