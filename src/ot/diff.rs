//! Deriving operation sets from `(old, new)` text pairs.
//!
//! The generator looks for a single contiguous edit: the longest common
//! prefix, then the longest common suffix of what remains. This covers
//! typing, backspacing and pasting exactly. Two separate edits in one diff
//! come out as one larger replacement spanning both; the result is always
//! correct, just not minimal.

use super::operation_set::OperationSet;
use serde::{Deserialize, Serialize};

/// Operations turning `old` into `new`.
///
/// Always satisfies `diff(old, new).apply(old) == Ok(new)`.
///
/// ```
/// use cowrite::ot::{diff, Operation};
///
/// let set = diff("Hello", "HelloX");
/// assert_eq!(set.operations(), &[Operation::retain(5), Operation::insert("X")]);
/// assert_eq!(set.apply("Hello").unwrap(), "HelloX");
/// ```
pub fn diff(old: &str, new: &str) -> OperationSet {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();
    let hunk = Hunk::locate(&old_chars, &new_chars);

    let mut set = OperationSet::new();
    set.retain(hunk.prefix);
    set.delete(hunk.removed_len(old_chars.len()));
    set.insert(hunk.inserted(&new_chars));
    set.retain(hunk.suffix);

    tracing::trace!(
        prefix = hunk.prefix,
        suffix = hunk.suffix,
        operations = set.len(),
        "generated diff"
    );
    set
}

/// Rough classification of an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    /// Texts are identical.
    None,
    /// Text was only added.
    Insert,
    /// Text was only removed.
    Delete,
    /// Text was removed and added at the same place.
    Replace,
}

/// The single hunk that separates two texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSummary {
    /// Character position where the texts start to differ.
    pub position: usize,
    /// Text removed from the old version.
    pub removed: String,
    /// Text added in the new version.
    pub inserted: String,
    /// Classification.
    pub kind: EditKind,
}

impl EditSummary {
    /// Net change in length, in characters.
    pub fn delta(&self) -> isize {
        self.inserted.chars().count() as isize - self.removed.chars().count() as isize
    }

    /// Where a caret most likely sits after the edit.
    pub fn caret_after(&self) -> usize {
        match self.kind {
            EditKind::Delete | EditKind::None => self.position,
            EditKind::Insert | EditKind::Replace => self.position + self.inserted.chars().count(),
        }
    }
}

/// Describe the hunk [`diff`] would produce for `old` and `new`.
pub fn summarize(old: &str, new: &str) -> EditSummary {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();
    let hunk = Hunk::locate(&old_chars, &new_chars);

    let removed: String = old_chars[hunk.prefix..old_chars.len() - hunk.suffix].iter().collect();
    let inserted = hunk.inserted(&new_chars);
    let kind = match (removed.is_empty(), inserted.is_empty()) {
        (true, true) => EditKind::None,
        (true, false) => EditKind::Insert,
        (false, true) => EditKind::Delete,
        (false, false) => EditKind::Replace,
    };

    EditSummary {
        position: hunk.prefix,
        removed,
        inserted,
        kind,
    }
}

/// Convert `\r\n` and lone `\r` line endings to `\n`.
///
/// Browsers submit form text with CRLF; diffing it against LF content would
/// otherwise produce spurious edits on every line.
///
/// ```
/// use cowrite::ot::normalize_line_endings;
///
/// assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
/// ```
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

struct Hunk {
    prefix: usize,
    suffix: usize,
}

impl Hunk {
    fn locate(old: &[char], new: &[char]) -> Self {
        let prefix = old
            .iter()
            .zip(new.iter())
            .take_while(|(a, b)| a == b)
            .count();

        // The suffix search only looks at what the prefix left over, so the
        // two regions never overlap.
        let suffix = old[prefix..]
            .iter()
            .rev()
            .zip(new[prefix..].iter().rev())
            .take_while(|(a, b)| a == b)
            .count();

        Hunk { prefix, suffix }
    }

    fn removed_len(&self, old_len: usize) -> usize {
        old_len - self.prefix - self.suffix
    }

    fn inserted(&self, new: &[char]) -> String {
        new[self.prefix..new.len() - self.suffix].iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ot::Operation;

    #[test]
    fn test_append() {
        let set = diff("Hello", "HelloX");
        assert_eq!(set.operations(), &[Operation::retain(5), Operation::insert("X")]);
    }

    #[test]
    fn test_identical_texts() {
        assert_eq!(diff("same", "same").operations(), &[Operation::retain(4)]);
        assert!(diff("", "").is_empty());
    }

    #[test]
    fn test_replacement_in_middle() {
        let set = diff("ABC", "AXC");
        assert_eq!(
            set.operations(),
            &[
                Operation::retain(1),
                Operation::delete(1),
                Operation::insert("X"),
                Operation::retain(1),
            ]
        );
    }

    #[test]
    fn test_repeated_characters_do_not_overlap() {
        // "aaa" -> "aa": prefix takes two characters, suffix gets nothing left
        let set = diff("aaa", "aa");
        assert_eq!(set.operations(), &[Operation::retain(2), Operation::delete(1)]);
        assert_eq!(set.apply("aaa").unwrap(), "aa");

        let set = diff("aa", "aaa");
        assert_eq!(set.apply("aa").unwrap(), "aaa");
    }

    #[test]
    fn test_clear_and_fill() {
        assert_eq!(diff("abc", "").operations(), &[Operation::delete(3)]);
        assert_eq!(diff("", "abc").operations(), &[Operation::insert("abc")]);
    }

    #[test]
    fn test_two_hunks_become_one_replacement() {
        let set = diff("one two three", "ONE two THREE");
        assert_eq!(set.apply("one two three").unwrap(), "ONE two THREE");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_multibyte_round_trip() {
        let old = "naïve café";
        let new = "naïve cafés 🚀";
        assert_eq!(diff(old, new).apply(old).unwrap(), new);
    }

    #[test]
    fn test_summarize_kinds() {
        assert_eq!(summarize("abc", "abc").kind, EditKind::None);
        assert_eq!(summarize("abc", "abXc").kind, EditKind::Insert);
        assert_eq!(summarize("abc", "ac").kind, EditKind::Delete);
        assert_eq!(summarize("abc", "aXc").kind, EditKind::Replace);
    }

    #[test]
    fn test_summarize_position_and_caret() {
        let summary = summarize("Hello world", "Hello brave world");
        assert_eq!(summary.position, 6);
        assert_eq!(summary.inserted, "brave ");
        assert_eq!(summary.removed, "");
        assert_eq!(summary.delta(), 6);
        assert_eq!(summary.caret_after(), 12);

        let summary = summarize("Hello", "Hell");
        assert_eq!(summary.caret_after(), 4);
        assert_eq!(summary.delta(), -1);
    }
}
