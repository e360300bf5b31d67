//! Paginated, newest-first views of a document's change log.

use crate::error::ValidationError;
use crate::types::ChangeRecord;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque position in a change log.
///
/// A cursor names the oldest record already returned; the next page holds
/// records strictly older than it. Callers should treat the encoded form as
/// an uninterpreted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryCursor {
    before: u64,
}

impl HistoryCursor {
    const PREFIX: &'static str = "v";

    /// Cursor selecting records with `to_version < before`.
    pub fn before(before: u64) -> Self {
        HistoryCursor { before }
    }

    /// The exclusive upper bound on `to_version`.
    pub fn to_version_bound(&self) -> u64 {
        self.before
    }

    /// URL-safe token form.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(format!("{}{}", Self::PREFIX, self.before))
    }

    /// Parse a token produced by [`HistoryCursor::encode`].
    pub fn decode(token: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidCursor(token.to_string());
        let bytes = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|_| invalid())?;
        let text = String::from_utf8(bytes).map_err(|_| invalid())?;
        let before = text
            .strip_prefix(Self::PREFIX)
            .and_then(|digits| digits.parse::<u64>().ok())
            .ok_or_else(invalid)?;
        Ok(HistoryCursor { before })
    }
}

impl fmt::Display for HistoryCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for HistoryCursor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for HistoryCursor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for HistoryCursor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Self::decode(&token).map_err(serde::de::Error::custom)
    }
}

/// One page of change records, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    /// Records ordered by descending `to_version`.
    pub records: Vec<ChangeRecord>,
    /// Cursor for the next (older) page, absent on the last page.
    pub next_cursor: Option<HistoryCursor>,
}

impl HistoryPage {
    /// Split a fetch of `limit + 1` records into a page and its cursor.
    pub(crate) fn from_overfetch(mut records: Vec<ChangeRecord>, limit: usize) -> Self {
        let next_cursor = if records.len() > limit {
            records.truncate(limit);
            records.last().map(|oldest| HistoryCursor::before(oldest.to_version))
        } else {
            None
        };
        HistoryPage { records, next_cursor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_token_roundtrip() {
        let cursor = HistoryCursor::before(42);
        let token = cursor.encode();
        assert!(!token.contains('='));
        assert_eq!(HistoryCursor::decode(&token).unwrap(), cursor);
    }

    #[test]
    fn test_foreign_cursor_rejected() {
        assert!(matches!(
            HistoryCursor::decode("not a cursor"),
            Err(ValidationError::InvalidCursor(_))
        ));
        let token = URL_SAFE_NO_PAD.encode("page=2");
        assert!(HistoryCursor::decode(&token).is_err());
    }

    #[test]
    fn test_cursor_serializes_as_string() {
        let json = serde_json::to_string(&HistoryCursor::before(7)).unwrap();
        let back: HistoryCursor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_version_bound(), 7);
    }
}
