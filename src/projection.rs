//! Plain-text projection of rich editor documents.
//!
//! The OT engine only ever sees plain text. Editors that store a Lexical
//! JSON tree convert it here, at the boundary, so that changes to the tree
//! format never reach the transform code.
//!
//! Block nodes (direct children of `root`) become lines separated by `\n`;
//! the text nodes inside a block are concatenated in document order.
//! Formatting is dropped.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Projection format version. Bump when the extraction rules change.
pub const PROJECTION_SCHEMA_VERSION: u32 = 1;

/// The plain text the OT engine operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextProjection {
    /// Rules the text was extracted with.
    pub schema_version: u32,
    /// Extracted text.
    pub text: String,
}

impl TextProjection {
    /// Wrap already-plain text.
    pub fn new(text: impl Into<String>) -> Self {
        TextProjection {
            schema_version: PROJECTION_SCHEMA_VERSION,
            text: text.into(),
        }
    }

    /// Extract text from a Lexical editor state.
    ///
    /// Accepts both the standard `{"root": {"children": [...]}}` shape and a
    /// bare `{"content": [...]}` list. Anything else yields empty text.
    ///
    /// ```
    /// use cowrite::projection::TextProjection;
    /// use serde_json::json;
    ///
    /// let state = json!({"root": {"children": [
    ///     {"type": "paragraph", "children": [{"type": "text", "text": "Hello"}]},
    ///     {"type": "paragraph", "children": [{"type": "text", "text": "world"}]},
    /// ]}});
    /// assert_eq!(TextProjection::from_lexical(&state).text, "Hello\nworld");
    /// ```
    pub fn from_lexical(state: &Value) -> Self {
        let blocks = state
            .pointer("/root/children")
            .and_then(Value::as_array)
            .filter(|children| !children.is_empty())
            .or_else(|| state.get("content").and_then(Value::as_array));

        let text = blocks
            .map(|blocks| {
                blocks
                    .iter()
                    .map(|block| {
                        let mut line = String::new();
                        collect_text(block, &mut line);
                        line
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        Self::new(text)
    }

    /// Build a minimal Lexical state holding this text, one paragraph per line.
    pub fn to_lexical(&self) -> Value {
        let children: Vec<Value> = self
            .text
            .split('\n')
            .map(|line| {
                let inline = if line.is_empty() {
                    vec![]
                } else {
                    vec![json!({
                        "type": "text",
                        "text": line,
                        "format": 0,
                        "style": "",
                        "mode": "normal",
                        "detail": 0,
                    })]
                };
                json!({
                    "type": "paragraph",
                    "children": inline,
                    "format": "",
                    "indent": 0,
                    "version": 1,
                })
            })
            .collect();

        json!({
            "root": {
                "type": "root",
                "format": "",
                "indent": 0,
                "version": 1,
                "children": children,
            }
        })
    }
}

fn collect_text(node: &Value, out: &mut String) {
    match node.get("type").and_then(Value::as_str) {
        Some("text") => {
            if let Some(text) = node.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        Some("linebreak") => out.push('\n'),
        _ => {
            let children = node
                .get("children")
                .or_else(|| node.get("content"))
                .and_then(Value::as_array);
            for child in children.into_iter().flatten() {
                collect_text(child, out);
            }
        }
    }
}
