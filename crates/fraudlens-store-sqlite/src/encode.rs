//! Encoding helpers between Rust domain types and the representations
//! stored in SQLite columns.
//!
//! Dates and timestamps are stored as ISO 8601 text so SQLite's date
//! functions (and bridge-generated SQL using them) work unmodified.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::ValueRef;

// ─── Temporal ────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String {
  d.format("%Y-%m-%d").to_string()
}

pub fn encode_ts(ts: NaiveDateTime) -> String {
  ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

// ─── Query output ────────────────────────────────────────────────────────────

/// Convert one fetched SQLite value into JSON for display.
pub fn value_to_json(v: ValueRef<'_>) -> serde_json::Value {
  match v {
    ValueRef::Null => serde_json::Value::Null,
    ValueRef::Integer(i) => serde_json::Value::from(i),
    ValueRef::Real(f) => serde_json::Number::from_f64(f)
      .map(serde_json::Value::Number)
      .unwrap_or(serde_json::Value::Null),
    ValueRef::Text(t) => {
      serde_json::Value::String(String::from_utf8_lossy(t).into_owned())
    }
    // No blob columns exist in this schema; show a placeholder rather
    // than failing the whole result set.
    ValueRef::Blob(b) => serde_json::Value::String(format!("<{} bytes>", b.len())),
  }
}
