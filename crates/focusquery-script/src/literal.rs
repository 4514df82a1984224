//! Literal encoding for generated script text.
//!
//! All encodings are deterministic: the same literal always renders to the
//! same bytes (this feeds the script-text determinism property).

use chrono::{DateTime, Utc};

/// Encode a string as a JS string literal (quoted, escaped).
///
/// serde_json escaping is valid JS: control characters, quotes and
/// backslashes are escaped, and the output contains no raw newlines, so the
/// literal is safe to inline into a single-line expression.
pub fn js_string(s: &str) -> String {
    serde_json::to_string(s).expect("string serialization is infallible")
}

/// Encode a string list as a JS array literal.
pub fn js_string_array(items: &[String]) -> String {
    let rendered: Vec<String> = items.iter().map(|s| js_string(s)).collect();
    format!("[{}]", rendered.join(", "))
}

/// Dates compare as epoch milliseconds on both dialects; the accessor side
/// resolves via `.getTime()` and the literal side is the raw number.
pub fn js_epoch_millis(date: DateTime<Utc>) -> String {
    date.timestamp_millis().to_string()
}
