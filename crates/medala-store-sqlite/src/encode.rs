//! Conversions between store values and SQLite column text, plus the range
//! bounds used for prefix scans.

use chrono::{DateTime, Utc};
use medala_core::store::Entry;
use serde_json::Value;

use crate::Result;

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn encode_value(v: &Value) -> Result<String> { Ok(serde_json::to_string(v)?) }

pub fn decode_value(s: &str) -> Result<Value> { Ok(serde_json::from_str(s)?) }

/// A row as read from `events`, before JSON decoding.
pub struct RawEntry {
  pub key:        String,
  pub value_json: String,
}

impl RawEntry {
  pub fn into_entry(self) -> Result<Entry> {
    Ok(Entry { value: decode_value(&self.value_json)?, key: self.key })
  }
}

// ─── Prefix bounds ───────────────────────────────────────────────────────────

fn next_char(c: char) -> Option<char> {
  match c {
    char::MAX => None,
    '\u{D7FF}' => Some('\u{E000}'),
    c => char::from_u32(c as u32 + 1),
  }
}

/// The smallest string greater than every string starting with `prefix`, or
/// `None` when no such bound exists (empty prefix, or all `char::MAX`).
///
/// SQLite's default BINARY collation compares UTF-8 bytes, which orders the
/// same way as code points, so a `key >= prefix AND key < successor` range
/// selects exactly the keys starting with `prefix`.
pub fn prefix_successor(prefix: &str) -> Option<String> {
  let mut chars: Vec<char> = prefix.chars().collect();
  while let Some(last) = chars.pop() {
    if let Some(next) = next_char(last) {
      chars.push(next);
      return Some(chars.into_iter().collect());
    }
  }
  None
}
