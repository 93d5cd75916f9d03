//! Type-aware equality used for change detection.

use serde_json::Value;

/// Trim string values; everything else is returned unchanged.
pub fn trimmed(value: Value) -> Value {
    match value {
        Value::String(s) => {
            let t = s.trim();
            if t.len() == s.len() {
                Value::String(s)
            } else {
                Value::String(t.to_string())
            }
        }
        other => other,
    }
}

/// `true` for `null` and for strings that are empty after trimming.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.trim().to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Compare two JSON values the way the project decides whether something
/// changed.
///
/// Arrays compare element-wise, objects key-wise (a missing key equals a
/// blank one), and scalars by their trimmed string form, so `null == ""`,
/// `"8" == 8` and `" pv " == "pv"`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            let null = Value::Null;
            x.iter()
                .all(|(k, v)| values_equal(v, y.get(k).unwrap_or(&null)))
                && y.iter()
                    .filter(|(k, _)| !x.contains_key(*k))
                    .all(|(_, v)| is_blank(v))
        }
        _ => match (scalar_text(a), scalar_text(b)) {
            (Some(l), Some(r)) => l == r,
            _ => false,
        },
    }
}
