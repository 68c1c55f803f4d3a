//! Target url resolution.
//!
//! Absolute `http`/`https` urls are used unchanged. Anything else is a path
//! resolved against the configured base url; there is no ambient origin.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;

// ============================================================================
// Constants
// ============================================================================

/// Query parameter carrying the negotiated connection id.
const CONNECTION_ID_PARAM: &str = "id";

// ============================================================================
// Resolution
// ============================================================================

/// Resolves a caller-supplied url to an absolute one.
///
/// # Errors
///
/// - [`Error::UnresolvableUrl`] if `raw` is relative and `base` is `None`
/// - [`Error::Url`] if the result is not a valid url
pub fn resolve_url(raw: &str, base: Option<&Url>) -> Result<Url> {
    if has_http_scheme(raw) {
        return Ok(Url::parse(raw)?);
    }

    let base = base.ok_or_else(|| Error::unresolvable_url(raw))?;

    // A single leading slash keeps the path on the base origin.
    let path = format!("/{}", raw.trim_start_matches('/'));
    Ok(base.join(&path)?)
}

/// Returns `url` with the connection id appended as a query parameter.
#[must_use]
pub fn with_connection_id(url: &Url, connection_id: &ConnectionId) -> Url {
    let mut url = url.clone();
    url.query_pairs_mut()
        .append_pair(CONNECTION_ID_PARAM, connection_id.as_str());
    url
}

fn has_http_scheme(raw: &str) -> bool {
    let Some((scheme, _)) = raw.split_once("://") else {
        return false;
    };
    scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn base() -> Url {
        Url::parse("https://app.example.com/some/page?x=1").expect("url")
    }

    #[test]
    fn test_absolute_url_unchanged() {
        let url = resolve_url("http://chat.example.com:5000/hub", None).expect("resolve");
        assert_eq!(url.as_str(), "http://chat.example.com:5000/hub");
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let url = resolve_url("HTTPS://chat.example.com/hub", None).expect("resolve");
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_relative_resolves_against_origin() {
        let url = resolve_url("/chat", Some(&base())).expect("resolve");
        assert_eq!(url.as_str(), "https://app.example.com/chat");
    }

    #[test]
    fn test_leading_slash_is_forced() {
        let url = resolve_url("chat", Some(&base())).expect("resolve");
        assert_eq!(url.as_str(), "https://app.example.com/chat");
    }

    #[test]
    fn test_protocol_relative_stays_on_origin() {
        let url = resolve_url("//evil.example.com/chat", Some(&base())).expect("resolve");
        assert_eq!(url.host_str(), Some("app.example.com"));
        assert_eq!(url.path(), "/evil.example.com/chat");
    }

    #[test]
    fn test_relative_without_base_fails() {
        let err = resolve_url("/chat", None).unwrap_err();
        assert!(matches!(err, Error::UnresolvableUrl { ref url } if url == "/chat"));
    }

    #[test]
    fn test_other_scheme_is_treated_as_path() {
        assert!(resolve_url("ws://example.com/chat", None).is_err());
    }

    #[test]
    fn test_with_connection_id() {
        let url = Url::parse("http://example.com/chat").expect("url");
        let url = with_connection_id(&url, &ConnectionId::new("abc 123"));
        assert_eq!(url.as_str(), "http://example.com/chat?id=abc+123");
    }

    #[test]
    fn test_with_connection_id_keeps_query() {
        let url = Url::parse("http://example.com/chat?token=t").expect("url");
        let url = with_connection_id(&url, &ConnectionId::new("abc"));
        assert_eq!(url.as_str(), "http://example.com/chat?token=t&id=abc");
    }

    proptest! {
        #[test]
        fn prop_relative_keeps_base_origin(path in "[a-z0-9/]{0,30}") {
            let url = resolve_url(&path, Some(&base())).expect("resolve");
            prop_assert_eq!(url.origin(), base().origin());
            prop_assert!(url.path().starts_with('/'));
        }
    }
}
