//! Rewriting concurrently-authored operation sets against each other.
//!
//! Both sets are walked in lockstep over their shared base document. Inserts
//! on either side are handled before anything is consumed; consuming pieces
//! are split at the shorter of the two so that every step covers the same
//! base range on both sides.
//!
//! | `a` \ `b` | Retain | Delete | Insert |
//! |-----------|--------|--------|--------|
//! | Retain | Retain | (dropped) | Retain over `b`'s text |
//! | Delete | Delete | (already gone) | Retain over `b`'s text |
//! | Insert | Insert | Insert | priority decides |

use super::operation::{char_len, Operation};
use super::operation_set::OperationSet;
use crate::error::TransformError;
use serde::{Deserialize, Serialize};

/// Which side's insert comes first when both insert at the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// The set being rewritten wins: its text lands before the other side's.
    #[default]
    Left,
    /// The already-applied set wins: its text stays first.
    Right,
}

impl Priority {
    /// The priority the other side must use for the two results to converge.
    pub fn flip(self) -> Self {
        match self {
            Priority::Left => Priority::Right,
            Priority::Right => Priority::Left,
        }
    }
}

/// What to do when both sides delete the same characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOverlap {
    /// Drop the overlap from the rewritten set; it is already deleted.
    #[default]
    Shrink,
    /// Refuse with [`TransformError::OverlappingDelete`].
    Reject,
}

/// Rewrite `a` so it applies after `b`, shrinking overlapping deletes.
///
/// Both sets must have been built against the same base text. For any such
/// pair the results converge:
///
/// ```
/// use cowrite::ot::{transform, OperationSet, Priority};
///
/// let base = "ABC";
/// let mut a = OperationSet::new();
/// a.retain(1).delete(1).retain(1);
/// let mut b = OperationSet::new();
/// b.retain(1).insert("Z").retain(2);
///
/// let a_then_b = transform(&b, &a, Priority::Right).unwrap().apply(&a.apply(base).unwrap()).unwrap();
/// let b_then_a = transform(&a, &b, Priority::Left).unwrap().apply(&b.apply(base).unwrap()).unwrap();
/// assert_eq!(a_then_b, "AZC");
/// assert_eq!(b_then_a, "AZC");
/// ```
pub fn transform(a: &OperationSet, b: &OperationSet, priority: Priority) -> Result<OperationSet, TransformError> {
    transform_with(a, b, priority, DeleteOverlap::Shrink)
}

/// [`transform`] with an explicit policy for overlapping deletes.
pub fn transform_with(
    a: &OperationSet,
    b: &OperationSet,
    priority: Priority,
    overlap: DeleteOverlap,
) -> Result<OperationSet, TransformError> {
    let (left, right) = (a.base_len(), b.base_len());
    if left != right {
        return Err(TransformError::BaseLengthMismatch { left, right });
    }

    let mut out = OperationSet::new();
    let mut ops_a = a.iter();
    let mut ops_b = b.iter();
    let mut head_a = ops_a.next().cloned();
    let mut head_b = ops_b.next().cloned();
    // Position in the shared base document.
    let mut position = 0usize;

    loop {
        match step(head_a.as_ref(), head_b.as_ref(), priority) {
            Step::Done => break,
            Step::KeepInsert => {
                if let Some(Operation::Insert { text, attributes }) = head_a.take() {
                    out.insert_with(text, attributes);
                }
                head_a = ops_a.next().cloned();
            }
            Step::SkipInsert(len) => {
                out.retain(len);
                head_b = ops_b.next().cloned();
            }
            Step::Exhausted => {
                // Unreachable once base lengths agree, but never trust it.
                return Err(TransformError::BaseLengthMismatch { left, right });
            }
            Step::Consume {
                len_a,
                len_b,
                delete_a,
                delete_b,
            } => {
                let len = len_a.min(len_b);
                match (delete_a, delete_b) {
                    (false, false) => {
                        out.retain(len);
                    }
                    (true, false) => {
                        out.delete(len);
                    }
                    (false, true) => {}
                    (true, true) => {
                        if overlap == DeleteOverlap::Reject {
                            return Err(TransformError::OverlappingDelete { position });
                        }
                    }
                }
                position = position.saturating_add(len);
                head_a = remainder(delete_a, len_a - len).or_else(|| ops_a.next().cloned());
                head_b = remainder(delete_b, len_b - len).or_else(|| ops_b.next().cloned());
            }
        }
    }

    Ok(out)
}

/// Fold `incoming` through every set of `history`, in order.
///
/// Each history entry must apply to the result of the previous one; the
/// first must share `incoming`'s base.
pub fn rebase<'a, I>(
    incoming: &OperationSet,
    history: I,
    priority: Priority,
    overlap: DeleteOverlap,
) -> Result<OperationSet, TransformError>
where
    I: IntoIterator<Item = &'a OperationSet>,
{
    let mut rebased = incoming.clone();
    for applied in history {
        rebased = transform_with(&rebased, applied, priority, overlap)?;
    }
    Ok(rebased)
}

enum Step {
    Done,
    KeepInsert,
    SkipInsert(usize),
    Exhausted,
    Consume {
        len_a: usize,
        len_b: usize,
        delete_a: bool,
        delete_b: bool,
    },
}

fn step(a: Option<&Operation>, b: Option<&Operation>, priority: Priority) -> Step {
    match (a, b) {
        (None, None) => Step::Done,
        (Some(Operation::Insert { .. }), Some(Operation::Insert { text, .. })) => match priority {
            Priority::Left => Step::KeepInsert,
            Priority::Right => Step::SkipInsert(char_len(text)),
        },
        (Some(Operation::Insert { .. }), _) => Step::KeepInsert,
        (_, Some(Operation::Insert { text, .. })) => Step::SkipInsert(char_len(text)),
        (None, Some(_)) | (Some(_), None) => Step::Exhausted,
        (Some(a), Some(b)) => Step::Consume {
            len_a: a.consumed_len(),
            len_b: b.consumed_len(),
            delete_a: matches!(a, Operation::Delete { .. }),
            delete_b: matches!(b, Operation::Delete { .. }),
        },
    }
}

fn remainder(delete: bool, len: usize) -> Option<Operation> {
    match (len, delete) {
        (0, _) => None,
        (len, true) => Some(Operation::delete(len)),
        (len, false) => Some(Operation::retain(len)),
    }
}
