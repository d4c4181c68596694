//! Serde helpers for fields the service sends in more than one JSON shape.

use serde::{de::Error, Deserialize, Deserializer};
use serde_json::Value;

/// Accept a string or a number, yielding its string form.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

/// Required variant of [`opt_string_or_number`].
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    opt_string_or_number(deserializer)?
        .ok_or_else(|| D::Error::custom("expected string or number, found null"))
}

/// Accept a number or a numeric string (form inputs arrive as strings).
pub fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("number out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("expected a numeric string, found {:?}", s))),
        other => Err(D::Error::custom(format!(
            "expected number or numeric string, found {}",
            other
        ))),
    }
}

/// Accept a non-negative integer or its string form. SQL drivers often send
/// aggregate counts as strings.
pub fn count_or_numeric_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom(format!("expected a non-negative count, found {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("expected a count, found {:?}", s))),
        other => Err(D::Error::custom(format!(
            "expected count or numeric string, found {}",
            other
        ))),
    }
}
