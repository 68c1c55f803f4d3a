//! Transport kinds known to the client.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// ============================================================================
// TransportKind
// ============================================================================

/// Built-in transport categories, named as the server advertises them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Full-duplex socket.
    WebSockets,
    /// Half-duplex server push.
    ServerSentEvents,
    /// Polling fallback.
    LongPolling,
}

impl TransportKind {
    /// All kinds, highest capability first.
    pub const ALL: [Self; 3] = [Self::WebSockets, Self::ServerSentEvents, Self::LongPolling];

    /// Returns the wire name of this kind.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WebSockets => "WebSockets",
            Self::ServerSentEvents => "ServerSentEvents",
            Self::LongPolling => "LongPolling",
        }
    }

    /// Returns `true` if the transport can send and receive on one channel.
    #[inline]
    #[must_use]
    pub const fn is_full_duplex(self) -> bool {
        matches!(self, Self::WebSockets)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::no_available_transport(format!("unknown transport '{s}'")))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in TransportKind::ALL {
            assert_eq!(kind.as_str().parse::<TransportKind>().expect("parse"), kind);
        }
    }

    #[test]
    fn test_unknown_name_rejected() {
        let err = "websockets".parse::<TransportKind>().unwrap_err();
        assert!(matches!(err, Error::NoAvailableTransport { .. }));
    }

    #[test]
    fn test_full_duplex() {
        assert!(TransportKind::WebSockets.is_full_duplex());
        assert!(!TransportKind::LongPolling.is_full_duplex());
    }
}
