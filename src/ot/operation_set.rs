//! Ordered operation sequences and their sequential application.

use super::operation::{char_len, Attributes, Operation};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered sequence of [`Operation`]s applied left to right.
///
/// Built through the chainable builder, which drops empty pieces and
/// coalesces adjacent operations of the same kind so that equal edits have
/// equal representations.
///
/// # Invariants
///
/// - no operation is empty
/// - no two neighbours can be merged
///
/// # Examples
///
/// ```
/// use cowrite::ot::OperationSet;
///
/// let mut set = OperationSet::new();
/// set.retain(2).retain(3).insert("!");
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.apply("Hello").unwrap(), "Hello!");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationSet {
    ops: Vec<Operation>,
}

impl OperationSet {
    /// An empty set (the identity on the empty string).
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalize raw operations, e.g. ones decoded from the wire.
    pub fn from_operations(operations: impl IntoIterator<Item = Operation>) -> Self {
        let mut set = Self::new();
        for op in operations {
            set.push(op);
        }
        set
    }

    /// Append `Retain(length)`.
    pub fn retain(&mut self, length: usize) -> &mut Self {
        self.push(Operation::retain(length))
    }

    /// Append `Delete(length)`.
    pub fn delete(&mut self, length: usize) -> &mut Self {
        self.push(Operation::delete(length))
    }

    /// Append `Insert(text)`.
    pub fn insert(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Operation::insert(text))
    }

    /// Append `Insert(text)` with formatting attributes.
    pub fn insert_with(&mut self, text: impl Into<String>, attributes: Option<Attributes>) -> &mut Self {
        self.push(Operation::Insert {
            text: text.into(),
            attributes,
        })
    }

    /// Append an operation, merging it into the last one when possible.
    pub fn push(&mut self, op: Operation) -> &mut Self {
        if op.is_empty() {
            return self;
        }
        let merged = match (self.ops.last_mut(), &op) {
            (Some(Operation::Retain { length }), Operation::Retain { length: more })
            | (Some(Operation::Delete { length }), Operation::Delete { length: more }) => {
                match length.checked_add(*more) {
                    Some(total) => {
                        *length = total;
                        true
                    }
                    None => false,
                }
            }
            (
                Some(Operation::Insert { text, attributes }),
                Operation::Insert {
                    text: more,
                    attributes: more_attributes,
                },
            ) if *attributes == *more_attributes => {
                text.push_str(more);
                true
            }
            _ => false,
        };
        if !merged {
            self.ops.push(op);
        }
        self
    }

    /// Number of operations.
    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the set holds no operations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate over the operations.
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.ops.iter()
    }

    /// The operations as a slice.
    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Consume the set, returning its operations.
    pub fn into_operations(self) -> Vec<Operation> {
        self.ops
    }

    /// Length of the text this set must be applied to.
    ///
    /// Saturates at `usize::MAX`, which no real text matches.
    pub fn base_len(&self) -> usize {
        self.ops
            .iter()
            .fold(0usize, |total, op| total.saturating_add(op.consumed_len()))
    }

    /// Length of the text this set produces.
    pub fn target_len(&self) -> usize {
        self.ops
            .iter()
            .fold(0usize, |total, op| total.saturating_add(op.produced_len()))
    }

    /// Whether applying the set leaves any text unchanged.
    pub fn is_noop(&self) -> bool {
        self.ops.iter().all(|op| matches!(op, Operation::Retain { .. }))
    }

    /// Check that this set fully consumes a source of `len` characters.
    pub fn validate(&self, len: usize) -> Result<(), ValidationError> {
        let mut cursor = 0usize;
        for (index, op) in self.ops.iter().enumerate() {
            let end = cursor.checked_add(op.consumed_len()).unwrap_or(usize::MAX);
            if end > len {
                return Err(ValidationError::OutOfBounds { index, end, len });
            }
            cursor = end;
        }
        if cursor != len {
            return Err(ValidationError::LengthMismatch {
                consumed: cursor,
                expected: len,
            });
        }
        Ok(())
    }

    /// Apply the set to `source`.
    ///
    /// Validation runs to completion before any output is built, so a
    /// rejected set never yields partial text.
    ///
    /// # Errors
    ///
    /// [`ValidationError::OutOfBounds`] when a retain or delete reads past the
    /// end of `source`, [`ValidationError::LengthMismatch`] when the set does
    /// not consume all of it.
    pub fn apply(&self, source: &str) -> Result<String, ValidationError> {
        self.validate(char_len(source))?;

        let mut result = String::with_capacity(source.len());
        let mut chars = source.chars();
        for op in &self.ops {
            match op {
                Operation::Retain { length } => result.extend(chars.by_ref().take(*length)),
                Operation::Delete { length } => {
                    for _ in chars.by_ref().take(*length) {}
                }
                Operation::Insert { text, .. } => result.push_str(text),
            }
        }
        Ok(result)
    }
}

impl<'a> IntoIterator for &'a OperationSet {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl IntoIterator for OperationSet {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl FromIterator<Operation> for OperationSet {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self::from_operations(iter)
    }
}

impl fmt::Display for OperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{op}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_json(json: &str) -> OperationSet {
        let ops: Vec<Operation> = serde_json::from_str(json).unwrap();
        OperationSet::from_operations(ops)
    }

    #[test]
    fn test_huge_delete_is_out_of_bounds() {
        let set = from_json(
            r#"[{"kind":"retain","length":2},{"kind":"delete","length":18446744073709551615},{"kind":"retain","length":2}]"#,
        );
        assert_eq!(
            set.apply("abc"),
            Err(ValidationError::OutOfBounds {
                index: 1,
                end: usize::MAX,
                len: 3
            })
        );
        assert_eq!(set.base_len(), usize::MAX);
    }

    #[test]
    fn test_merge_that_would_overflow_keeps_both() {
        let mut set = OperationSet::new();
        set.retain(1).retain(usize::MAX);
        assert_eq!(set.operations(), &[Operation::retain(1), Operation::retain(usize::MAX)]);
        assert!(set.iter().all(|op| !op.is_empty()));
        assert!(matches!(set.apply("a"), Err(ValidationError::OutOfBounds { index: 1, .. })));
    }

    #[test]
    fn test_apply_sequential() {
        let mut set = OperationSet::new();
        set.retain(1).delete(1).insert("Z").retain(1);
        assert_eq!(set.apply("ABC").unwrap(), "AZC");
    }

    #[test]
    fn test_builder_coalesces() {
        let mut set = OperationSet::new();
        set.retain(1).retain(2).delete(1).delete(1).insert("a").insert("b");
        assert_eq!(
            set.operations(),
            &[Operation::retain(3), Operation::delete(2), Operation::insert("ab")]
        );
    }

    #[test]
    fn test_builder_drops_empty() {
        let mut set = OperationSet::new();
        set.retain(0).insert("").delete(0);
        assert!(set.is_empty());
        assert_eq!(set.apply("").unwrap(), "");
    }

    #[test]
    fn test_inserts_with_different_attributes_stay_apart() {
        let mut bold = Attributes::new();
        bold.insert("bold".into(), true.into());
        let mut set = OperationSet::new();
        set.insert("a").insert_with("b", Some(bold));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut set = OperationSet::new();
        set.retain(2);
        assert_eq!(
            set.apply("ABC"),
            Err(ValidationError::LengthMismatch { consumed: 2, expected: 3 })
        );
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut set = OperationSet::new();
        set.retain(2).delete(5);
        assert_eq!(
            set.apply("ABC"),
            Err(ValidationError::OutOfBounds { index: 1, end: 7, len: 3 })
        );
    }

    #[test]
    fn test_insert_does_not_consume() {
        let mut set = OperationSet::new();
        set.insert("only");
        assert_eq!(set.base_len(), 0);
        assert_eq!(set.apply("").unwrap(), "only");
        assert!(set.apply("x").is_err());
    }

    #[test]
    fn test_multibyte_text() {
        let mut set = OperationSet::new();
        set.retain(1).delete(1).insert("ö").retain(1);
        assert_eq!(set.apply("aéz").unwrap(), "aöz");
        assert_eq!(set.base_len(), 3);
        assert_eq!(set.target_len(), 3);
    }

    #[test]
    fn test_from_operations_canonicalizes() {
        let set = OperationSet::from_operations(vec![
            Operation::retain(1),
            Operation::retain(0),
            Operation::retain(4),
        ]);
        assert_eq!(set.operations(), &[Operation::retain(5)]);
        assert!(set.is_noop());
    }

    #[test]
    fn test_display() {
        let mut set = OperationSet::new();
        set.retain(5).insert("X");
        assert_eq!(set.to_string(), "[Retain(5), Insert(\"X\")]");
    }

    #[test]
    fn test_serializes_as_array() {
        let mut set = OperationSet::new();
        set.retain(5).insert("X");
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"[{"kind":"retain","length":5},{"kind":"insert","text":"X"}]"#);
    }
}
