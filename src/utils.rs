//! CSV line encoding shared by the instrument list and the record sink

use serde_json::Value;

/// Render one JSON value as a CSV field
///
/// Strings are written raw, null as an empty field, other scalars as their
/// JSON text and nested arrays/objects as compact JSON. The result is quoted
/// when it contains a comma, a quote or a line break.
///
/// Booleans therefore come out as `true`/`false` and nested values as JSON
/// such as `[[0.05,1.0]]`. Older output files may hold Python-style
/// `True`/`False` and reprs (`[[0.05, 1.0]]`, single-quoted keys) instead,
/// so appending to one of those mixes both renderings.
pub fn csv_field(value: &Value) -> String {
    let raw = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    csv_escape(&raw)
}

/// Quote a plain string for CSV if needed
pub fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Join already-escaped fields into a single CRLF-terminated line
pub fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(field.as_ref());
    }
    line.push_str("\r\n");
    line
}
