//! [`Records`]: typed, namespaced access to a user's records over any
//! [`EventStore`].
//!
//! This is where keys are built, timestamps assigned, payloads validated, and
//! scans re-sorted. The store itself returns prefix scans in arbitrary order;
//! every list coming out of here is sorted by the timestamp embedded in the
//! key, newest first.

use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  aggregate::{
    self, DailyTotals, DayWindow, FoodIndex, HealthIndex, Insights, RiskAnalysis,
  },
  clock::{Clock, SystemClock},
  config::AnalysisConfig,
  keys::{self, RecordFamily, UserId},
  record::{LabResult, MetricSample, NutritionEntry, Profile, Record, Stamped, TextNote},
  store::{Entry, EventStore},
};

/// Pagination parameters for [`Records::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
  pub limit:  Option<usize>,
  #[serde(default)]
  pub offset: usize,
}

/// Typed repository over an [`EventStore`].
///
/// Cloning is cheap; the store and clock are reference-counted.
pub struct Records<S> {
  store: Arc<S>,
  clock: Arc<dyn Clock>,
}

impl<S> Clone for Records<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), clock: Arc::clone(&self.clock) }
  }
}

impl<S: EventStore> Records<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self::with_clock(store, Arc::new(SystemClock::new()))
  }

  pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self { Self { store, clock } }

  pub fn store(&self) -> &S { &self.store }

  // ── Profile ─────────────────────────────────────────────────────────────

  /// Overwrite the user's profile.
  pub async fn save_profile(&self, user: &UserId, profile: Profile) -> Result<Profile> {
    profile.validate()?;
    let key = keys::singleton_key(RecordFamily::Profile, user);
    let value = serde_json::to_value(&profile)?;
    self.store.set(&key, value).await.map_err(Error::storage)?;
    Ok(profile)
  }

  /// The user's profile, or `None` if they never saved one.
  pub async fn find_profile(&self, user: &UserId) -> Result<Option<Profile>> {
    let key = keys::singleton_key(RecordFamily::Profile, user);
    let value = self.store.get(&key).await.map_err(Error::storage)?;
    Ok(value.map(serde_json::from_value).transpose()?)
  }

  /// The user's profile; [`Error::NotFound`] if absent.
  pub async fn profile(&self, user: &UserId) -> Result<Profile> {
    self
      .find_profile(user)
      .await?
      .ok_or_else(|| Error::NotFound(format!("profile for user {user}")))
  }

  // ── Append-only families ────────────────────────────────────────────────

  /// Validate and store `record` under `family:user:now`.
  ///
  /// Two appends in the same clock tick share a key; the second overwrites
  /// the first.
  pub async fn append<R: Record>(&self, user: &UserId, record: R) -> Result<Stamped<R>> {
    record.validate()?;
    let stamped = Stamped { timestamp: self.clock.now_millis(), record };
    let key = keys::record_key(R::FAMILY, user, stamped.timestamp);
    let value = serde_json::to_value(&stamped)?;
    self.store.set(&key, value).await.map_err(Error::storage)?;
    Ok(stamped)
  }

  /// The record written at exactly `timestamp`.
  pub async fn get<R: Record>(&self, user: &UserId, timestamp: i64) -> Result<Stamped<R>> {
    let key = keys::record_key(R::FAMILY, user, timestamp);
    let value = self
      .store
      .get(&key)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::NotFound(format!("record {key}")))?;
    Ok(serde_json::from_value(value)?)
  }

  /// Every record of `R`'s family for `user`, newest first.
  pub async fn scan<R: Record>(&self, user: &UserId) -> Result<Vec<Stamped<R>>> {
    let prefix = keys::family_prefix(R::FAMILY, user);
    let entries = self.store.get_by_prefix(&prefix).await.map_err(Error::storage)?;
    sort_newest_first(entries)
  }

  /// One page of [`Records::scan`].
  pub async fn list<R: Record>(&self, user: &UserId, page: Page) -> Result<Vec<Stamped<R>>> {
    let all = self.scan::<R>(user).await?;
    let it = all.into_iter().skip(page.offset);
    Ok(match page.limit {
      Some(limit) => it.take(limit).collect(),
      None => it.collect(),
    })
  }

  /// The newest `n` records, newest first.
  pub async fn latest<R: Record>(&self, user: &UserId, n: usize) -> Result<Vec<Stamped<R>>> {
    self.list(user, Page { limit: Some(n), offset: 0 }).await
  }

  /// How many records of `R`'s family `user` has.
  pub async fn count<R: Record>(&self, user: &UserId) -> Result<usize> {
    let prefix = keys::family_prefix(R::FAMILY, user);
    let entries = self.store.get_by_prefix(&prefix).await.map_err(Error::storage)?;
    Ok(entries.len())
  }

  /// Remove one record. Returns `false` if there was nothing at that key.
  pub async fn delete<R: Record>(&self, user: &UserId, timestamp: i64) -> Result<bool> {
    let key = keys::record_key(R::FAMILY, user, timestamp);
    self.store.delete(&key).await.map_err(Error::storage)
  }

  // ── Derived views ───────────────────────────────────────────────────────

  /// Macro totals for `day`.
  pub async fn daily_totals(&self, user: &UserId, day: &DayWindow) -> Result<DailyTotals> {
    let entries = self.scan::<NutritionEntry>(user).await?;
    Ok(aggregate::daily_totals(&entries, day))
  }

  pub async fn health_index(&self, user: &UserId, cfg: &AnalysisConfig) -> Result<HealthIndex> {
    let samples = self.scan::<MetricSample>(user).await?;
    Ok(aggregate::health_index(&samples, cfg))
  }

  pub async fn food_index<Tz>(
    &self,
    user: &UserId,
    now: &DateTime<Tz>,
    cfg: &AnalysisConfig,
  ) -> Result<FoodIndex>
  where
    Tz: TimeZone,
  {
    let entries = self.scan::<NutritionEntry>(user).await?;
    Ok(aggregate::food_index(&entries, now, cfg))
  }

  /// Summary of how many meals, lab results and text notes `user` logged.
  pub async fn insights(&self, user: &UserId) -> Result<Insights> {
    let meals = self.count::<NutritionEntry>(user).await?;
    let labs = self.count::<LabResult>(user).await?;
    let notes = self.count::<TextNote>(user).await?;
    Ok(aggregate::insights(meals, labs, notes))
  }

  /// Risk analysis over the newest metric samples.
  ///
  /// Fails with [`Error::Precondition`] when the user has no profile; a
  /// default risk level is never returned in that case.
  pub async fn risk_analysis(&self, user: &UserId, cfg: &AnalysisConfig) -> Result<RiskAnalysis> {
    let profile = self.find_profile(user).await?.ok_or_else(|| {
      Error::Precondition(format!("risk analysis requires a profile for user {user}"))
    })?;
    let samples = self.scan::<MetricSample>(user).await?;
    Ok(aggregate::analyze(&profile, &samples, cfg))
  }
}

/// Decode scanned entries and order them by key timestamp, newest first.
///
/// The key, not the payload, is authoritative: it is what the store used to
/// discriminate the write.
fn sort_newest_first<R: Record>(entries: Vec<Entry>) -> Result<Vec<Stamped<R>>> {
  let mut keyed: Vec<(i64, String, Stamped<R>)> = entries
    .into_iter()
    .map(|Entry { key, value }| -> Result<(i64, String, Stamped<R>)> {
      let ts = keys::parse_record_key(&key)
        .map(|(_, _, ts)| ts)
        .ok_or_else(|| {
          <serde_json::Error as serde::de::Error>::custom(format!(
            "malformed record key {key:?}"
          ))
        })?;
      let record: Stamped<R> = serde_json::from_value(value)?;
      Ok((ts, key, record))
    })
    .collect::<Result<_>>()?;

  keyed.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
  Ok(keyed.into_iter().map(|(_, _, r)| r).collect())
}
