//! Tolerant numeric parsing for loosely typed payloads
//!
//! Counts may arrive as JSON numbers or as locale-formatted strings where
//! `.` groups thousands and `,` separates decimals. Nothing here panics or
//! returns an error: anything unparsable is `None`.

use serde_json::Value;

/// Parse an integer count from a JSON value.
///
/// Floats are truncated toward zero; strings go through
/// [`parse_locale_int`]. Booleans, arrays and objects are `None`.
pub fn parse_flexible_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_to_int)),
        Value::String(s) => parse_locale_int(s),
        _ => None,
    }
}

/// Parse `"1.234"` as 1234 and `"12,5"` as 12.
///
/// Whitespace is dropped, every `.` is treated as a thousands separator
/// and `,` as the decimal point. When that reading fails the raw text is
/// tried as a plain float.
pub fn parse_locale_int(text: &str) -> Option<i64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let localized = compact.replace('.', "").replace(',', ".");
    localized
        .parse::<f64>()
        .ok()
        .and_then(float_to_int)
        .or_else(|| text.trim().parse::<f64>().ok().and_then(float_to_int))
}

/// Parse a coordinate component: JSON number or plain float text
pub fn parse_flexible_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn float_to_int(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return None;
    }
    Some(truncated as i64)
}
