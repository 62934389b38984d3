//! Deserializers for fields that older documents store loosely: nulls where a
//! value is expected, and integers written as strings.

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// `null` reads as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Leading integer of a string, as `parseInt` reads it: `" 12abc"` is 12,
/// `"abc"` is nothing.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Integer from a number (fractions truncated) or a numeric string.
pub fn loose_int(raw: &JsonValue) -> Option<i64> {
    match raw {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        JsonValue::String(s) => parse_leading_int(s),
        _ => None,
    }
}

pub fn loose_optional_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_int(&JsonValue::deserialize(deserializer)?))
}

/// Non-negative count; anything unreadable or negative is 0.
pub fn loose_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(loose_int(&JsonValue::deserialize(deserializer)?)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0))
}
