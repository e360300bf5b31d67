//! The three primitive OT operations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Pass-through formatting metadata carried by inserts.
pub type Attributes = Map<String, Value>;

/// A single step of an [`OperationSet`](super::OperationSet).
///
/// Operations are sequential: `Retain` and `Delete` consume characters of the
/// source text at the cursor, `Insert` emits text without moving the cursor.
/// Lengths count Unicode scalar values.
///
/// On the wire each operation is a record discriminated by `kind`:
///
/// ```
/// use cowrite::ot::Operation;
///
/// let op: Operation = serde_json::from_str(r#"{"kind":"retain","length":5}"#).unwrap();
/// assert_eq!(op, Operation::retain(5));
///
/// let json = serde_json::to_string(&Operation::insert("X")).unwrap();
/// assert_eq!(json, r#"{"kind":"insert","text":"X"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Operation {
    /// Copy `length` characters from the source.
    Retain {
        /// Characters to keep.
        length: usize,
    },
    /// Skip `length` characters of the source.
    Delete {
        /// Characters to remove.
        length: usize,
    },
    /// Emit `text` at the cursor.
    Insert {
        /// Inserted text.
        text: String,
        /// Optional formatting metadata, never interpreted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attributes: Option<Attributes>,
    },
}

impl Operation {
    /// `Retain(length)`.
    pub fn retain(length: usize) -> Self {
        Operation::Retain { length }
    }

    /// `Delete(length)`.
    pub fn delete(length: usize) -> Self {
        Operation::Delete { length }
    }

    /// `Insert(text)` without attributes.
    pub fn insert(text: impl Into<String>) -> Self {
        Operation::Insert {
            text: text.into(),
            attributes: None,
        }
    }

    /// `Insert(text)` carrying attributes.
    pub fn insert_with(text: impl Into<String>, attributes: Attributes) -> Self {
        Operation::Insert {
            text: text.into(),
            attributes: Some(attributes),
        }
    }

    /// Characters of the source this operation consumes.
    #[inline]
    pub fn consumed_len(&self) -> usize {
        match self {
            Operation::Retain { length } | Operation::Delete { length } => *length,
            Operation::Insert { .. } => 0,
        }
    }

    /// Characters this operation contributes to the result.
    #[inline]
    pub fn produced_len(&self) -> usize {
        match self {
            Operation::Retain { length } => *length,
            Operation::Delete { .. } => 0,
            Operation::Insert { text, .. } => char_len(text),
        }
    }

    /// Whether applying this operation changes nothing at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Operation::Retain { length } | Operation::Delete { length } => *length == 0,
            Operation::Insert { text, .. } => text.is_empty(),
        }
    }

    /// Whether this is an `Insert`.
    #[inline]
    pub fn is_insert(&self) -> bool {
        matches!(self, Operation::Insert { .. })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Retain { length } => write!(f, "Retain({length})"),
            Operation::Delete { length } => write!(f, "Delete({length})"),
            Operation::Insert { text, .. } => write!(f, "Insert({text:?})"),
        }
    }
}

/// Length of `text` in characters.
#[inline]
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let ops = vec![
            Operation::retain(2),
            Operation::delete(1),
            Operation::insert("hi"),
        ];
        let value = serde_json::to_value(&ops).unwrap();
        assert_eq!(
            value,
            json!([
                {"kind": "retain", "length": 2},
                {"kind": "delete", "length": 1},
                {"kind": "insert", "text": "hi"},
            ])
        );
    }

    #[test]
    fn test_insert_attributes_pass_through() {
        let raw = json!({"kind": "insert", "text": "b", "attributes": {"bold": true}});
        let op: Operation = serde_json::from_value(raw.clone()).unwrap();
        match &op {
            Operation::Insert { attributes: Some(attrs), .. } => assert_eq!(attrs["bold"], true),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(serde_json::to_value(&op).unwrap(), raw);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result: Result<Operation, _> = serde_json::from_str(r#"{"kind":"replace","length":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_lengths_count_chars() {
        let op = Operation::insert("héllo");
        assert_eq!(op.produced_len(), 5);
        assert_eq!(op.consumed_len(), 0);
        assert_eq!(Operation::delete(3).consumed_len(), 3);
        assert_eq!(Operation::delete(3).produced_len(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Operation::retain(5).to_string(), "Retain(5)");
        assert_eq!(Operation::insert("X").to_string(), "Insert(\"X\")");
    }
}
