//! Lenient timestamp decoding.
//!
//! The detection service emits timestamps in three shapes: unix seconds as a float
//! (push messages), SQLite `CURRENT_TIMESTAMP` strings in UTC (history rows) and
//! RFC 3339 strings.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Parse a JSON value into a UTC timestamp.
pub fn from_value(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().and_then(from_unix_seconds),
        serde_json::Value::String(s) => parse_str(s),
        _ => None,
    }
}

/// Unix seconds (fractional) to UTC.
pub fn from_unix_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9).round() as u32;
    Utc.timestamp_opt(whole, nanos.min(999_999_999)).single()
}

/// RFC 3339 or `YYYY-MM-DD HH:MM:SS[.fff]` (assumed UTC).
pub fn parse_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// `deserialize_with` helper for required timestamps.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp: {}", value)))
}

/// `deserialize_with` helper for optional timestamps. Unparseable values become `None`.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(from_value))
}
