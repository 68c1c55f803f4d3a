//! Redirect-coded close reasons.
//!
//! Some transports report an auth failure by closing with a reason like
//! `"Unauthorized: redirect to /login/"` instead of a status code. The
//! trailing `/` is a delimiter, not part of the location.

// ============================================================================
// Imports
// ============================================================================

use crate::error::Error;

// ============================================================================
// Constants
// ============================================================================

/// Reason prefix for an authentication redirect.
const UNAUTHORIZED_PREFIX: &str = "Unauthorized: redirect to ";

/// Reason prefix for an authorization redirect.
const FORBIDDEN_PREFIX: &str = "Forbidden: redirect to ";

/// Closing delimiter after the location.
const LOCATION_DELIMITER: char = '/';

// ============================================================================
// Redirect
// ============================================================================

/// A redirect extracted from a close reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// Not authenticated; go to the location to sign in.
    Unauthorized(String),
    /// Authenticated but not permitted.
    Forbidden(String),
}

impl Redirect {
    /// Returns the target location.
    #[inline]
    #[must_use]
    pub fn location(&self) -> &str {
        match self {
            Self::Unauthorized(location) | Self::Forbidden(location) => location,
        }
    }

    /// Converts the redirect into the matching error.
    #[must_use]
    pub fn into_error(self) -> Error {
        match self {
            Self::Unauthorized(location) => Error::unauthorized(location),
            Self::Forbidden(location) => Error::forbidden(location),
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Extracts a redirect from a close reason.
///
/// Returns `None` for ordinary close reasons and malformed redirects.
#[must_use]
pub fn parse_redirect(reason: &str) -> Option<Redirect> {
    if let Some(location) = extract_location(reason, UNAUTHORIZED_PREFIX) {
        return Some(Redirect::Unauthorized(location));
    }
    extract_location(reason, FORBIDDEN_PREFIX).map(Redirect::Forbidden)
}

fn extract_location(reason: &str, prefix: &str) -> Option<String> {
    let location = reason
        .strip_prefix(prefix)?
        .strip_suffix(LOCATION_DELIMITER)?;
    (!location.is_empty()).then(|| location.to_string())
}

// ============================================================================
// Tests
// ============================================================================
