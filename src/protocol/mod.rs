//! Wire-level value types.
//!
//! # Protocol Overview
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | `NegotiateResponse` | Server → Client | Connection id and advertised transports |
//! | `Payload` | Both | Opaque application data |
//! | `TransferFormat` | Both | Text or binary framing |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `format` | Payload and transfer format |
//! | `negotiate` | Negotiation response body |

// ============================================================================
// Submodules
// ============================================================================

/// Payload and transfer format types.
pub mod format;

/// Negotiation response body.
pub mod negotiate;

// ============================================================================
// Re-exports
// ============================================================================

pub use format::{Payload, TransferFormat};
pub use negotiate::NegotiateResponse;
