//! Transport selection policy.
//!
//! # Rules
//!
//! 1. No preference: the first advertised kind the factory can construct.
//! 2. Preferred kind: used only if the server also advertises it.
//! 3. Custom transport: used as-is, ignoring the advertised list.
//! 4. Otherwise: [`Error::NoAvailableTransport`].
//!
//! The server's advertised order is the only tie-break.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};

use super::{Transport, TransportFactory, TransportKind};

// ============================================================================
// TransportChoice
// ============================================================================

/// What the caller asked for.
#[derive(Clone)]
pub enum TransportChoice {
    /// A built-in kind, subject to the server's advertised list.
    Kind(TransportKind),
    /// A caller-built transport, used unconditionally.
    Custom(Arc<dyn Transport>),
}

impl TransportChoice {
    /// Wraps a caller-built transport.
    #[inline]
    #[must_use]
    pub fn custom(transport: impl Transport + 'static) -> Self {
        Self::Custom(Arc::new(transport))
    }

    /// Returns the preferred kind, if this is not a custom transport.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> Option<TransportKind> {
        match self {
            Self::Kind(kind) => Some(*kind),
            Self::Custom(_) => None,
        }
    }
}

impl From<TransportKind> for TransportChoice {
    fn from(kind: TransportKind) -> Self {
        Self::Kind(kind)
    }
}

impl fmt::Debug for TransportChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            Self::Custom(transport) => f.debug_tuple("Custom").field(&transport.name()).finish(),
        }
    }
}

// ============================================================================
// SelectedTransport
// ============================================================================

/// Outcome of selection.
pub struct SelectedTransport {
    /// The transport to connect.
    pub transport: Arc<dyn Transport>,
    /// Kind of the transport, `None` for custom transports.
    pub kind: Option<TransportKind>,
}

impl SelectedTransport {
    /// Name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> String {
        self.kind
            .map_or_else(|| self.transport.name().to_string(), |kind| kind.to_string())
    }
}

impl fmt::Debug for SelectedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedTransport")
            .field("name", &self.name())
            .field("kind", &self.kind)
            .finish()
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Picks a kind from the advertised list.
///
/// Returns `None` when no kind satisfies the rules.
#[must_use]
pub fn choose_kind(
    preferred: Option<TransportKind>,
    available: &[TransportKind],
    supports: impl Fn(TransportKind) -> bool,
) -> Option<TransportKind> {
    match preferred {
        Some(kind) => (available.contains(&kind) && supports(kind)).then_some(kind),
        None => available.iter().copied().find(|kind| supports(*kind)),
    }
}

/// Produces the transport to connect with.
///
/// # Errors
///
/// Returns [`Error::NoAvailableTransport`] if nothing satisfies the rules.
pub fn select_transport(
    choice: Option<&TransportChoice>,
    available: &[TransportKind],
    factory: &dyn TransportFactory,
) -> Result<SelectedTransport> {
    if let Some(TransportChoice::Custom(transport)) = choice {
        debug!(transport = transport.name(), "Using custom transport");
        return Ok(SelectedTransport {
            transport: Arc::clone(transport),
            kind: None,
        });
    }

    let preferred = choice.and_then(TransportChoice::kind);

    let Some(kind) = choose_kind(preferred, available, |kind| factory.supports(kind)) else {
        let advertised = available
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let message = match preferred {
            Some(kind) => format!("{kind} was requested but the server offers [{advertised}]"),
            None => format!("none of the server's transports [{advertised}] are supported"),
        };
        return Err(Error::no_available_transport(message));
    };

    debug!(transport = %kind, "Selected transport");

    Ok(SelectedTransport {
        transport: factory.create(kind)?,
        kind: Some(kind),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::transport::{TransportRegistry, WebSocketTransport};

    use crate::transport::TransportKind::{LongPolling, ServerSentEvents, WebSockets};

    fn all_supported() -> TransportRegistry {
        TransportKind::ALL
            .into_iter()
            .fold(TransportRegistry::new(), |registry, kind| {
                registry.register(kind, || Arc::new(WebSocketTransport::new()))
            })
    }

    #[test]
    fn test_first_advertised_wins_without_preference() {
        let selected = select_transport(None, &[LongPolling, ServerSentEvents], &all_supported())
            .expect("select");
        assert_eq!(selected.kind, Some(LongPolling));
    }

    #[test]
    fn test_unsupported_kinds_are_skipped() {
        let registry = TransportRegistry::with_defaults();
        let selected = select_transport(None, &[LongPolling, WebSockets], &registry).expect("select");
        assert_eq!(selected.kind, Some(WebSockets));
    }

    #[test]
    fn test_preferred_used_when_advertised() {
        let choice = TransportChoice::from(ServerSentEvents);
        let selected = select_transport(
            Some(&choice),
            &[WebSockets, ServerSentEvents],
            &all_supported(),
        )
        .expect("select");
        assert_eq!(selected.kind, Some(ServerSentEvents));
    }

    #[test]
    fn test_preferred_missing_from_advertised_fails() {
        let choice = TransportChoice::from(WebSockets);
        let err = select_transport(Some(&choice), &[LongPolling], &all_supported())
            .err()
            .expect("should fail");
        assert!(matches!(err, Error::NoAvailableTransport { .. }));
        assert!(err.to_string().contains("WebSockets was requested"));
    }

    #[test]
    fn test_custom_bypasses_advertised() {
        let choice = TransportChoice::custom(WebSocketTransport::new());
        let selected =
            select_transport(Some(&choice), &[], &TransportRegistry::new()).expect("select");
        assert!(selected.kind.is_none());
        assert_eq!(selected.name(), "WebSockets");
    }

    #[test]
    fn test_empty_advertised_fails() {
        let err = select_transport(None, &[], &all_supported())
            .err()
            .expect("should fail");
        assert!(matches!(err, Error::NoAvailableTransport { .. }));
    }

    fn kind_strategy() -> impl Strategy<Value = TransportKind> {
        prop_oneof![Just(WebSockets), Just(ServerSentEvents), Just(LongPolling)]
    }

    proptest! {
        #[test]
        fn prop_choice_is_advertised(
            available in proptest::collection::vec(kind_strategy(), 0..6),
            preferred in proptest::option::of(kind_strategy()),
        ) {
            if let Some(kind) = choose_kind(preferred, &available, |_| true) {
                prop_assert!(available.contains(&kind));
                if let Some(preferred) = preferred {
                    prop_assert_eq!(kind, preferred);
                }
            }
        }

        #[test]
        fn prop_no_preference_takes_first(
            available in proptest::collection::vec(kind_strategy(), 1..6),
        ) {
            prop_assert_eq!(choose_kind(None, &available, |_| true), Some(available[0]));
        }
    }
}
