//! Transfer format and payload types.
//!
//! Payloads are opaque to the connection. The transfer format only decides
//! whether a transport carries them as text or binary frames.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// TransferFormat
// ============================================================================

/// Frame kind negotiated per connect call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferFormat {
    /// UTF-8 text frames.
    #[default]
    Text,
    /// Binary frames.
    Binary,
}

impl fmt::Display for TransferFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("Text"),
            Self::Binary => f.write_str("Binary"),
        }
    }
}

// ============================================================================
// Payload
// ============================================================================

/// An application payload carried by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Text payload.
    Text(String),
    /// Binary payload.
    Binary(Vec<u8>),
}

impl Payload {
    /// Creates a text payload.
    #[inline]
    #[must_use]
    pub fn text(data: impl Into<String>) -> Self {
        Self::Text(data.into())
    }

    /// Creates a binary payload.
    #[inline]
    #[must_use]
    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Self::Binary(data.into())
    }

    /// Returns the format this payload is framed as.
    #[inline]
    #[must_use]
    pub const fn format(&self) -> TransferFormat {
        match self {
            Self::Text(_) => TransferFormat::Text,
            Self::Binary(_) => TransferFormat::Binary,
        }
    }

    /// Returns the payload bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Returns the payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_is_text() {
        assert_eq!(TransferFormat::default(), TransferFormat::Text);
    }

    #[test]
    fn test_payload_format() {
        assert_eq!(Payload::text("hi").format(), TransferFormat::Text);
        assert_eq!(Payload::binary(vec![1, 2]).format(), TransferFormat::Binary);
    }

    #[test]
    fn test_payload_bytes() {
        let payload = Payload::text("abc");
        assert_eq!(payload.as_bytes(), b"abc");
        assert_eq!(payload.len(), 3);
        assert!(!payload.is_empty());
        assert!(Payload::binary(Vec::new()).is_empty());
    }
}
