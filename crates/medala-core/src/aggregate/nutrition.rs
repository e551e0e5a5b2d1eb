//! Daily macro totals and the food index.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};

use super::display_score;
use crate::{
  config::{AnalysisConfig, MacroTargets},
  record::{NutritionEntry, Stamped},
};

// ─── Calendar days ───────────────────────────────────────────────────────────

/// A local calendar day as a half-open range of epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
  pub date:     NaiveDate,
  pub start_ms: i64,
  /// Exclusive.
  pub end_ms:   i64,
}

const MINUTES_PER_DAY: i64 = 24 * 60;

/// The first instant of `date` in `tz`. When a DST jump skips midnight the
/// day starts at the first local minute that exists.
fn local_midnight_ms<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> i64 {
  let midnight = date.and_time(NaiveTime::MIN);
  (0..MINUTES_PER_DAY)
    .find_map(|m| {
      let local = midnight.checked_add_signed(TimeDelta::minutes(m))?;
      tz.from_local_datetime(&local).earliest()
    })
    .map(|dt| dt.timestamp_millis())
    .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
}

impl DayWindow {
  /// The day `date` in time zone `tz`.
  pub fn for_date<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
    let next = date.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX);
    Self {
      date,
      start_ms: local_midnight_ms(date, tz),
      end_ms: local_midnight_ms(next, tz),
    }
  }

  /// The local day containing `now`.
  pub fn containing<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
    Self::for_date(now.date_naive(), &now.timezone())
  }

  pub fn contains(&self, timestamp_ms: i64) -> bool {
    self.start_ms <= timestamp_ms && timestamp_ms < self.end_ms
  }
}

fn local_date<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> Option<NaiveDate> {
  DateTime::from_timestamp_millis(timestamp_ms).map(|dt| dt.with_timezone(tz).date_naive())
}

// ─── Daily totals ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotals {
  pub date:          NaiveDate,
  pub calories:      f64,
  pub protein:       f64,
  pub fat:           f64,
  pub carbohydrates: f64,
  pub entries:       usize,
}

impl DailyTotals {
  fn empty(date: NaiveDate) -> Self {
    Self {
      date,
      calories: 0.0,
      protein: 0.0,
      fat: 0.0,
      carbohydrates: 0.0,
      entries: 0,
    }
  }

  fn add(&mut self, entry: &NutritionEntry) {
    self.calories += entry.calories;
    self.protein += entry.protein;
    self.fat += entry.fat;
    self.carbohydrates += entry.carbohydrates;
    self.entries += 1;
  }
}

/// Sum the macros of every entry logged within `day`. No entries yields all
/// zeros.
pub fn daily_totals(entries: &[Stamped<NutritionEntry>], day: &DayWindow) -> DailyTotals {
  entries
    .iter()
    .filter(|e| day.contains(e.timestamp))
    .fold(DailyTotals::empty(day.date), |mut acc, e| {
      acc.add(&e.record);
      acc
    })
}

// ─── Food index ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayScore {
  pub totals: DailyTotals,
  /// 0–10.
  pub index:  f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodIndex {
  /// 0–10.
  pub food_index:        f64,
  pub score:             u8,
  pub insufficient_data: bool,
  /// Days in the lookback that have at least one entry, oldest first.
  pub days:              Vec<DayScore>,
}

fn day_index(totals: &DailyTotals, targets: &MacroTargets) -> f64 {
  let parts = [
    (&targets.calories, totals.calories),
    (&targets.protein, totals.protein),
    (&targets.fat, totals.fat),
    (&targets.carbohydrates, totals.carbohydrates),
  ];
  let total_weight: f64 = parts.iter().map(|(r, _)| r.weight.max(0.0)).sum();
  if total_weight <= 0.0 {
    return 0.0;
  }
  parts
    .iter()
    .map(|(r, v)| r.weight.max(0.0) * r.score(*v))
    .sum::<f64>()
    / total_weight
}

/// Score adherence to the macro targets over the last `food_lookback_days`
/// local days ending with the day of `now`. Days without entries are skipped
/// rather than scored as zero intake.
pub fn food_index<Tz: TimeZone>(
  entries: &[Stamped<NutritionEntry>],
  now: &DateTime<Tz>,
  cfg: &AnalysisConfig,
) -> FoodIndex {
  let tz = now.timezone();
  let today = now.date_naive();
  let lookback = u64::from(cfg.food_lookback_days.max(1) - 1);
  let first = today.checked_sub_days(Days::new(lookback)).unwrap_or(NaiveDate::MIN);

  let mut by_day: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();
  for e in entries {
    let Some(date) = local_date(e.timestamp, &tz) else { continue };
    if date < first || date > today {
      continue;
    }
    by_day
      .entry(date)
      .or_insert_with(|| DailyTotals::empty(date))
      .add(&e.record);
  }

  let days: Vec<DayScore> = by_day
    .into_values()
    .map(|totals| DayScore { index: day_index(&totals, &cfg.macros), totals })
    .collect();

  let (food_index, insufficient_data) = if days.is_empty() {
    (cfg.neutral_index, true)
  } else {
    let sum: f64 = days.iter().map(|d| d.index).sum();
    ((sum / days.len() as f64).clamp(0.0, 10.0), false)
  };

  FoodIndex {
    food_index,
    score: display_score(food_index),
    insufficient_data,
    days,
  }
}
