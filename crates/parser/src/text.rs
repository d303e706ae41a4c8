//! Small text helpers shared by every renderer
//!
//! All limits count characters, never bytes, so multi-byte text is never cut
//! inside a code point.

use serde_json::Value;

/// Longest prefix of `text` with at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// `text` cut to `max` characters with `marker` appended when it was longer
pub fn truncate_with(text: &str, max: usize, marker: &str) -> String {
    let head = truncate_chars(text, max);
    if head.len() < text.len() {
        format!("{}{}", head, marker)
    } else {
        text.to_string()
    }
}

/// Value as plain text: strings unquoted, everything else as JSON
pub fn plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
