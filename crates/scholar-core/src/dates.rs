//! Lenient decoding of dates and flags in stored scholar documents.
//!
//! Scholar profiles are schemaless JSON documents and older records may carry
//! dates as RFC 3339 strings, bare `YYYY-MM-DD` dates, epoch milliseconds, or
//! garbage, and flags as `null`. Anything that cannot be read decodes to a
//! neutral value so that one bad field never poisons the whole document.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse a timestamp string, accepting RFC 3339 or a bare calendar date
/// (interpreted as midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

/// Interpret an arbitrary JSON value as a timestamp.
pub fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
  match value {
    Value::String(s) => parse_timestamp(s),
    Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
    _ => None,
  }
}

/// `deserialize_with` adapter for `Option<DateTime<Utc>>` fields. Pair it with
/// `#[serde(default)]` so absent fields also decode to `None`.
pub fn lenient<'de, D>(de: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<Value>::deserialize(de)?;
  Ok(raw.as_ref().and_then(timestamp_from_value))
}

/// `deserialize_with` adapter for `bool` flags: only a JSON `true` is true;
/// `null`, strings, numbers and the like decode to `false`.
pub fn lenient_flag<'de, D>(de: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = Option::<Value>::deserialize(de)?;
  Ok(matches!(raw, Some(Value::Bool(true))))
}
