//! Key schemes for the per-user record families.
//!
//! Singleton records live at `family:user`, append-only records at
//! `family:user:timestamp`. The timestamp is milliseconds since the epoch,
//! assigned at write time, and doubles as the uniqueness discriminator: two
//! writes in the same tick map to the same key and the later one wins.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{Error, Result};

pub const SEPARATOR: char = ':';

// ─── Families ────────────────────────────────────────────────────────────────

/// A named category of record with its own key scheme.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordFamily {
  Profile,
  Metric,
  Nutrition,
  Lab,
  Voice,
  Note,
  Text,
}

impl RecordFamily {
  /// Whether the family holds exactly one record per user.
  pub fn is_singleton(self) -> bool { matches!(self, Self::Profile) }
}

// ─── User identity ───────────────────────────────────────────────────────────

/// A validated user identifier, safe to embed in a key.
///
/// The separator is rejected so that the prefix of one user can never be a
/// prefix of another user's keys (`metric:a:` vs `metric:a:b:...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
  pub fn new(raw: impl Into<String>) -> Result<Self> {
    let raw = raw.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err(Error::Validation("user id must not be empty".into()));
    }
    if trimmed.contains(SEPARATOR) {
      return Err(Error::Validation(format!(
        "user id {trimmed:?} must not contain {SEPARATOR:?}"
      )));
    }
    Ok(Self(trimmed.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl<'de> Deserialize<'de> for UserId {
  fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let raw = String::deserialize(deserializer)?;
    UserId::new(raw).map_err(serde::de::Error::custom)
  }
}

// ─── Key construction ────────────────────────────────────────────────────────

/// `family:user` is the key of a singleton record.
pub fn singleton_key(family: RecordFamily, user: &UserId) -> String {
  format!("{family}{SEPARATOR}{user}")
}

/// `family:user:timestamp` is the key of an append-only record.
pub fn record_key(family: RecordFamily, user: &UserId, timestamp: i64) -> String {
  format!("{family}{SEPARATOR}{user}{SEPARATOR}{timestamp}")
}

/// `family:user:`; scanning this prefix yields every record of `family`
/// belonging to `user` and nobody else.
pub fn family_prefix(family: RecordFamily, user: &UserId) -> String {
  format!("{family}{SEPARATOR}{user}{SEPARATOR}")
}

/// Recover the timestamp embedded in an append-only key produced by
/// [`record_key`]. Returns `None` for singleton or malformed keys.
pub fn parse_record_key(key: &str) -> Option<(RecordFamily, &str, i64)> {
  let mut parts = key.splitn(3, SEPARATOR);
  let family = parts.next()?.parse().ok()?;
  let user = parts.next()?;
  let timestamp = parts.next()?.parse().ok()?;
  Some((family, user, timestamp))
}
