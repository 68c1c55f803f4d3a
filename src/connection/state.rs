//! Connection lifecycle states.
//!
//! ```text
//! Initial ──► Connecting ──► Connected
//!    │             │             │
//!    └─────────────┴─────────────┴──► Disconnected (terminal)
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of a [`super::Connection`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Created, `start` not yet called.
    #[default]
    Initial,
    /// Negotiating or connecting a transport.
    Connecting,
    /// A transport is connected and payloads may be sent.
    Connected,
    /// Stopped or failed. Terminal.
    Disconnected,
}

impl ConnectionState {
    /// Returns `true` if `next` is a legal successor of this state.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Initial, Self::Connecting)
                | (Self::Connecting, Self::Connected)
                | (_, Self::Disconnected)
        )
    }

    /// Returns `true` for the terminal state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Returns `true` if payloads may be sent.
    #[inline]
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initial => "Initial",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Tests
// ============================================================================
