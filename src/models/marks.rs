use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// `username -> mark`, one document per assessment.
pub type MarksSheet = BTreeMap<String, Option<f64>>;

/// Numbers pass through, numeric strings are parsed, anything else clears the mark.
pub fn coerce_mark(raw: &JsonValue) -> Option<f64> {
    match raw {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
