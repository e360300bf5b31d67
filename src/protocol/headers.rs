//! Header names and value helpers.
//!
//! | Header | Direction | Format | Example |
//! |--------|-----------|--------|---------|
//! | `X-Actor-Id` | request | opaque string | `alice` |
//! | `ETag` | response | quoted fingerprint | `"9f86d0…"` |
//! | `X-Document-Version` | response | decimal | `3` |

use crate::types::Fingerprint;

/// Identifies the author of a request.
pub const ACTOR_ID: &str = "x-actor-id";

/// Version of the document after the request.
pub const DOCUMENT_VERSION: &str = "x-document-version";

/// Format a fingerprint as a strong entity tag.
///
/// ```
/// use cowrite::protocol::format_etag;
/// use cowrite::Fingerprint;
///
/// let fp = Fingerprint::of("hello", 1);
/// assert_eq!(format_etag(&fp), format!("\"{}\"", fp));
/// ```
pub fn format_etag(fingerprint: &Fingerprint) -> String {
    format!("\"{}\"", fingerprint)
}

/// Extract the fingerprint from an entity tag, accepting weak and unquoted forms.
///
/// ```
/// use cowrite::protocol::parse_etag;
///
/// assert_eq!(parse_etag("\"abc\""), Some("abc"));
/// assert_eq!(parse_etag("W/\"abc\""), Some("abc"));
/// assert_eq!(parse_etag("abc"), Some("abc"));
/// assert_eq!(parse_etag("  "), None);
/// ```
pub fn parse_etag(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_prefix("W/").unwrap_or(trimmed);
    let tag = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed);
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}
