//! Defensive accessors over loosely-typed event payloads.
//!
//! Agent backends disagree on field names and types, so every lookup here returns
//! `None` for anything absent, empty, or of an unexpected type instead of failing.

use serde_json::{Map, Value};
use std::time::Duration;

/// Marker appended to any string cut short by [`truncate`].
pub const ELLIPSIS: &str = "...";

/// Typed lookups on a JSON value that may or may not be an object.
pub trait ValueExt {
    /// A non-empty string field.
    fn text(&self, key: &str) -> Option<&str>;

    /// The first non-empty string among `keys`.
    fn first_text(&self, keys: &[&str]) -> Option<&str>;

    /// A field that is present and not "empty" (null, false, "", [], {}).
    fn present(&self, key: &str) -> Option<&Value>;

    /// The first present field among `keys`.
    fn first_present(&self, keys: &[&str]) -> Option<&Value>;

    /// A nested object field.
    fn object(&self, key: &str) -> Option<&Map<String, Value>>;

    /// A nested array field.
    fn array(&self, key: &str) -> Option<&Vec<Value>>;

    /// A boolean field that is explicitly `true`.
    fn flag(&self, key: &str) -> bool;
}

impl ValueExt for Value {
    fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    fn first_text(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.text(key))
    }

    fn present(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|v| is_truthy(v))
    }

    fn first_present(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|key| self.present(key))
    }

    fn object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    fn array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(is_truthy)
    }
}

/// Loose truthiness: null, false, zero and empty containers count as absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Render a value as display text. Strings are unquoted, everything else is JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Join the first `limit` elements of a list with single spaces.
pub fn join_values(values: &[Value], limit: usize) -> String {
    values
        .iter()
        .take(limit)
        .map(display_value)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Command-like field as text: strings verbatim, lists joined (first `limit` tokens).
/// Empty results are `None`.
pub fn command_text(value: &Value, limit: usize) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Array(parts) => join_values(parts, limit),
        Value::Null | Value::Bool(false) => return None,
        other => display_value(other),
    };
    (!text.is_empty()).then_some(text)
}

/// Final path component, splitting on the last `/`.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Cut `s` to `limit` characters and append [`ELLIPSIS`] when it is longer.
///
/// Re-truncating the result at the same limit returns it unchanged, since the
/// first `limit` characters are preserved.
pub fn truncate(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{}", &s[..cut], ELLIPSIS),
        None => s.to_string(),
    }
}

/// Elapsed time as shown in item lines and the status line: `4.2s` or `3m7s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let minutes = (secs / 60.0).floor() as u64;
        let remaining = secs - (minutes as f64) * 60.0;
        format!("{}m{:.0}s", minutes, remaining)
    }
}
