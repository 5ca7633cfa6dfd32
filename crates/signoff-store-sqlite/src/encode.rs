//! Encoding helpers between domain types and SQLite column text.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase, identifiers
//! a JSON array of `[key, value]` pairs in identifier order.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use signoff_core::Identifier;
use uuid::Uuid;

use crate::{Error, Result};

pub fn encode_key(id: &Identifier) -> String {
  let pairs = id
    .parts()
    .iter()
    .map(|(key, value)| json!([key, value.to_json()]))
    .collect();
  Value::Array(pairs).to_string()
}

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_json(s: Option<String>) -> Result<Option<Value>> {
  s.map(|s| serde_json::from_str(&s)).transpose().map_err(Error::from)
}
