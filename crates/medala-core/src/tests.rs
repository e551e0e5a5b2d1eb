//! Repository tests against in-process fake stores.

use std::{
  collections::BTreeMap,
  sync::{Arc, Mutex},
};

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{Value, json};

use crate::{
  Error,
  aggregate::{AlertSeverity, DayWindow, RiskLevel},
  clock::ManualClock,
  config::AnalysisConfig,
  keys::UserId,
  record::{
    ClinicalNote, Dimension, LabResult, MetricSample, NutritionEntry, Profile, Reading,
    TextNote, VoiceNote,
  },
  records::{Page, Records},
  store::{Entry, EventStore},
};

// ─── Fakes ───────────────────────────────────────────────────────────────────

/// The order a fake hands back prefix-scan results in.
#[derive(Clone, Copy)]
enum ScanOrder {
  Ascending,
  Descending,
  /// Even positions first, then odd ones.
  Interleaved,
}

struct MemStore {
  data:  Mutex<BTreeMap<String, Value>>,
  order: ScanOrder,
}

impl MemStore {
  fn new(order: ScanOrder) -> Self { Self { data: Mutex::default(), order } }
}

#[derive(Debug, thiserror::Error)]
#[error("backend unavailable")]
struct Unavailable;

impl EventStore for MemStore {
  type Error = Unavailable;

  async fn set(&self, key: &str, value: Value) -> Result<(), Unavailable> {
    self.data.lock().unwrap().insert(key.to_owned(), value);
    Ok(())
  }

  async fn get(&self, key: &str) -> Result<Option<Value>, Unavailable> {
    Ok(self.data.lock().unwrap().get(key).cloned())
  }

  async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Entry>, Unavailable> {
    let mut hits: Vec<Entry> = self
      .data
      .lock()
      .unwrap()
      .iter()
      .filter(|(k, _)| k.starts_with(prefix))
      .map(|(k, v)| Entry { key: k.clone(), value: v.clone() })
      .collect();
    match self.order {
      ScanOrder::Ascending => {}
      ScanOrder::Descending => hits.reverse(),
      ScanOrder::Interleaved => {
        let (even, odd): (Vec<_>, Vec<_>) =
          hits.into_iter().enumerate().partition(|(i, _)| i % 2 == 0);
        hits = even.into_iter().chain(odd).map(|(_, e)| e).collect();
      }
    }
    Ok(hits)
  }

  async fn delete(&self, key: &str) -> Result<bool, Unavailable> {
    Ok(self.data.lock().unwrap().remove(key).is_some())
  }
}

/// Fails every call and counts how many it saw.
#[derive(Default)]
struct DownStore {
  calls: Mutex<usize>,
}

impl DownStore {
  fn hit(&self) -> Unavailable {
    *self.calls.lock().unwrap() += 1;
    Unavailable
  }
}

impl EventStore for DownStore {
  type Error = Unavailable;

  async fn set(&self, _: &str, _: Value) -> Result<(), Unavailable> { Err(self.hit()) }

  async fn get(&self, _: &str) -> Result<Option<Value>, Unavailable> { Err(self.hit()) }

  async fn get_by_prefix(&self, _: &str) -> Result<Vec<Entry>, Unavailable> {
    Err(self.hit())
  }

  async fn delete(&self, _: &str) -> Result<bool, Unavailable> { Err(self.hit()) }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

const T0: i64 = 1_772_352_000_000; // 2026-03-01T08:00:00Z

fn records(order: ScanOrder) -> (Records<MemStore>, Arc<ManualClock>) {
  let clock = Arc::new(ManualClock::at(T0));
  let records = Records::with_clock(Arc::new(MemStore::new(order)), clock.clone());
  (records, clock)
}

fn user(id: &str) -> UserId { UserId::new(id).unwrap() }

fn profile(name: &str) -> Profile {
  let mut p = Profile::default();
  p.personal.full_name = name.into();
  p.primary_diagnosis = Some("Hypertension".into());
  p
}

fn meal(calories: f64) -> NutritionEntry {
  NutritionEntry {
    calories,
    protein: 20.0,
    fat: 10.0,
    carbohydrates: 40.0,
    description: "meal".into(),
  }
}

fn bp(systolic: f64) -> MetricSample {
  MetricSample::new(vec![Reading::BloodPressure { systolic, diastolic: 85.0 }])
}

// ─── Store contract through the repository ───────────────────────────────────

#[tokio::test]
async fn set_then_get_returns_value_unchanged() {
  let store = MemStore::new(ScanOrder::Ascending);
  let value = json!({ "nested": { "list": [1, 2, 3] }, "s": "x" });
  store.set("k:1", value.clone()).await.unwrap();
  assert_eq!(store.get("k:1").await.unwrap(), Some(value));
}

#[tokio::test]
async fn appended_record_reads_back_unchanged() {
  let (r, _) = records(ScanOrder::Ascending);
  let u = user("user_1");
  let note = ClinicalNote {
    subjective: "Dizzy for 3 days".into(),
    plan: "Recheck in a week".into(),
    tags: vec!["follow-up".into()],
    ..Default::default()
  };
  let written = r.append(&u, note.clone()).await.unwrap();
  assert_eq!(written.timestamp, T0);

  let read = r.get::<ClinicalNote>(&u, T0).await.unwrap();
  assert_eq!(read, written);
  assert_eq!(read.record, note);
}

#[tokio::test]
async fn profile_is_overwritten_on_save() {
  let (r, _) = records(ScanOrder::Ascending);
  let u = user("user_1");
  assert!(matches!(r.profile(&u).await, Err(Error::NotFound(_))));

  r.save_profile(&u, profile("First")).await.unwrap();
  r.save_profile(&u, profile("Second")).await.unwrap();
  assert_eq!(r.profile(&u).await.unwrap().personal.full_name, "Second");
}

#[tokio::test]
async fn prefix_scan_is_isolated_per_user() {
  let (r, clock) = records(ScanOrder::Ascending);
  let alice = user("alice");
  let alicia = user("alice_2");

  r.append(&alice, bp(120.0)).await.unwrap();
  clock.advance(1);
  r.append(&alicia, bp(130.0)).await.unwrap();
  clock.advance(1);
  r.append(&alice, bp(125.0)).await.unwrap();
  clock.advance(1);
  r.append(&alice, meal(300.0)).await.unwrap();

  let raw = r.store().get_by_prefix("metric:alice:").await.unwrap();
  assert_eq!(raw.len(), 2);
  assert!(raw.iter().all(|e| e.key.starts_with("metric:alice:")));

  let mine = r.scan::<MetricSample>(&alice).await.unwrap();
  let values: Vec<_> = mine
    .iter()
    .map(|s| s.record.reading(Dimension::BloodPressure).unwrap().value())
    .collect();
  assert_eq!(values, vec![125.0, 120.0]);
}

#[tokio::test]
async fn scan_order_does_not_depend_on_store_order() {
  let mut orders = Vec::new();
  for order in [ScanOrder::Ascending, ScanOrder::Descending, ScanOrder::Interleaved] {
    let (r, clock) = records(order);
    let u = user("u");
    // Mixed digit counts so lexicographic and numeric order disagree.
    for ts in [T0, 9, 10_000, 99, T0 + 5] {
      clock.set(ts);
      r.append(&u, VoiceNote { file: None, transcript: None, summary: format!("{ts}") })
        .await
        .unwrap();
    }
    let got: Vec<i64> = r
      .scan::<VoiceNote>(&u)
      .await
      .unwrap()
      .iter()
      .map(|s| s.timestamp)
      .collect();
    orders.push(got);
  }
  assert_eq!(orders[0], vec![T0 + 5, T0, 10_000, 99, 9]);
  assert_eq!(orders[0], orders[1]);
  assert_eq!(orders[0], orders[2]);
}

#[tokio::test]
async fn same_tick_writes_collide_and_last_wins() {
  let (r, _) = records(ScanOrder::Ascending);
  let u = user("user_1");

  r.append(&u, meal(100.0)).await.unwrap();
  r.append(&u, meal(200.0)).await.unwrap();

  let all = r.scan::<NutritionEntry>(&u).await.unwrap();
  assert_eq!(all.len(), 1, "second write must overwrite the first");
  assert_eq!(all[0].record.calories, 200.0);
  assert_eq!(r.get::<NutritionEntry>(&u, T0).await.unwrap().record.calories, 200.0);
}

#[tokio::test]
async fn list_paginates_newest_first() {
  let (r, clock) = records(ScanOrder::Descending);
  let u = user("u");
  for i in 0..5 {
    clock.set(T0 + i);
    r.append(&u, meal(100.0 * (i + 1) as f64)).await.unwrap();
  }
  let page = r
    .list::<NutritionEntry>(&u, Page { limit: Some(2), offset: 1 })
    .await
    .unwrap();
  let calories: Vec<_> = page.iter().map(|s| s.record.calories).collect();
  assert_eq!(calories, vec![400.0, 300.0]);

  let rest = r.list::<NutritionEntry>(&u, Page { limit: None, offset: 3 }).await.unwrap();
  assert_eq!(rest.len(), 2);

  let newest = r.latest::<NutritionEntry>(&u, 1).await.unwrap();
  assert_eq!(newest[0].timestamp, T0 + 4);
}

#[tokio::test]
async fn delete_removes_only_that_record() {
  let (r, clock) = records(ScanOrder::Ascending);
  let u = user("u");
  r.append(&u, meal(1.0)).await.unwrap();
  clock.advance(1);
  r.append(&u, meal(2.0)).await.unwrap();

  assert!(r.delete::<NutritionEntry>(&u, T0).await.unwrap());
  assert!(!r.delete::<NutritionEntry>(&u, T0).await.unwrap());
  let left = r.scan::<NutritionEntry>(&u).await.unwrap();
  assert_eq!(left.len(), 1);
  assert_eq!(left[0].record.calories, 2.0);
}

#[tokio::test]
async fn undecodable_value_is_a_serialization_error() {
  let (r, _) = records(ScanOrder::Ascending);
  r.store()
    .set("nutrition:u:1", json!({ "timestamp": 1, "calories": "lots" }))
    .await
    .unwrap();
  let err = r.scan::<NutritionEntry>(&user("u")).await.unwrap_err();
  assert!(matches!(err, Error::Serialization(_)), "{err:?}");
}

// ─── Failure semantics ───────────────────────────────────────────────────────

#[tokio::test]
async fn storage_failure_is_surfaced() {
  let r = Records::new(Arc::new(DownStore::default()));
  let u = user("u");
  assert!(matches!(r.append(&u, meal(1.0)).await, Err(Error::Storage(_))));
  assert!(matches!(r.scan::<MetricSample>(&u).await, Err(Error::Storage(_))));
  let day = DayWindow::containing(&Utc::now());
  assert!(matches!(r.daily_totals(&u, &day).await, Err(Error::Storage(_))));
}

#[tokio::test]
async fn invalid_payload_never_reaches_the_store() {
  let store = Arc::new(DownStore::default());
  let r = Records::new(store.clone());
  let u = user("u");

  let err = r.append(&u, MetricSample::new(vec![])).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
  let err = r.save_profile(&u, Profile::default()).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
  assert_eq!(*store.calls.lock().unwrap(), 0);
}

// ─── Aggregation scenarios ───────────────────────────────────────────────────

#[tokio::test]
async fn three_meals_today_total_1250_calories() {
  let (r, clock) = records(ScanOrder::Interleaved);
  let u = user("user_1");
  r.save_profile(&u, profile("User One")).await.unwrap();

  // Yesterday's meal must not count.
  clock.set(T0 - 86_400_000);
  r.append(&u, meal(900.0)).await.unwrap();

  for (i, kcal) in [400.0, 600.0, 250.0].into_iter().enumerate() {
    clock.set(T0 + i as i64 * 3_600_000);
    r.append(&u, meal(kcal)).await.unwrap();
  }

  let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
  let totals = r.daily_totals(&u, &DayWindow::for_date(today, &Utc)).await.unwrap();
  assert_eq!(totals.calories, 1250.0);
  assert_eq!(totals.protein, 60.0);
  assert_eq!(totals.entries, 3);
}

#[tokio::test]
async fn daily_totals_without_entries_are_zero() {
  let (r, _) = records(ScanOrder::Ascending);
  let day = DayWindow::containing(&Utc.timestamp_millis_opt(T0).unwrap());
  let totals = r.daily_totals(&user("nobody"), &day).await.unwrap();
  assert_eq!(
    (totals.calories, totals.protein, totals.fat, totals.carbohydrates),
    (0.0, 0.0, 0.0, 0.0)
  );
}

#[tokio::test]
async fn risk_analysis_without_profile_is_precondition_error() {
  let (r, _) = records(ScanOrder::Ascending);
  let u = user("user_1");
  r.append(&u, bp(150.0)).await.unwrap();

  let err = r.risk_analysis(&u, &AnalysisConfig::default()).await.unwrap_err();
  assert!(matches!(err, Error::Precondition(_)), "{err:?}");
}

#[tokio::test]
async fn declining_blood_pressure_produces_critical_alert() {
  let (r, clock) = records(ScanOrder::Descending);
  let u = user("user_1");
  r.save_profile(&u, profile("User One")).await.unwrap();

  for (i, systolic) in [118.0, 121.0, 119.0, 132.0, 141.0, 150.0].into_iter().enumerate() {
    clock.set(T0 + i as i64 * 86_400_000);
    r.append(&u, bp(systolic)).await.unwrap();
  }

  let analysis = r.risk_analysis(&u, &AnalysisConfig::default()).await.unwrap();
  assert_eq!(analysis.risk_level, RiskLevel::High);
  let alert = analysis
    .alerts
    .iter()
    .find(|a| a.dimension == Dimension::BloodPressure)
    .expect("blood pressure alert");
  assert_eq!(alert.severity, AlertSeverity::Critical);
  assert!(alert.message.contains("Blood pressure"));
  assert_eq!(alert.timestamp, T0 + 5 * 86_400_000);
}

#[tokio::test]
async fn insights_count_meals_labs_and_text_notes() {
  let (r, clock) = records(ScanOrder::Ascending);
  let u = user("u");
  let other = user("u2");

  let empty = r.insights(&u).await.unwrap();
  assert!(empty.summary.starts_with("Start logging"));

  for i in 0..3 {
    clock.set(T0 + i);
    r.append(&u, meal(300.0)).await.unwrap();
  }
  r.append(&u, LabResult { file_name: "cbc.pdf".into(), file: None, summary: "Normal".into() })
    .await
    .unwrap();
  r.append(&u, TextNote { summary: "Tired after lunch".into() }).await.unwrap();
  // Neither counts toward `u`.
  r.append(&u, bp(120.0)).await.unwrap();
  r.append(&other, TextNote { summary: "Someone else".into() }).await.unwrap();

  let i = r.insights(&u).await.unwrap();
  assert_eq!((i.meals, i.lab_results, i.health_notes), (3, 1, 1));
  assert!(i.summary.starts_with("You have logged 3 meals, 1 lab results, and 1 health notes."));
}

#[tokio::test]
async fn health_and_food_index_fold_scanned_records() {
  let (r, clock) = records(ScanOrder::Interleaved);
  let u = user("u");
  for i in 0..3 {
    clock.set(T0 + i);
    r.append(&u, MetricSample::new(vec![Reading::Glucose { mg_dl: 100.0 }]))
      .await
      .unwrap();
  }
  clock.set(T0);
  r.append(&u, NutritionEntry {
    calories:      2100.0,
    protein:       90.0,
    fat:           60.0,
    carbohydrates: 260.0,
    description:   "day".into(),
  })
  .await
  .unwrap();

  let cfg = AnalysisConfig::default();
  let hi = r.health_index(&u, &cfg).await.unwrap();
  assert!(!hi.insufficient_data);
  assert_eq!(hi.score, 88);

  let now = Utc.timestamp_millis_opt(T0 + 3_600_000).unwrap();
  let fi = r.food_index(&u, &now, &cfg).await.unwrap();
  assert_eq!(fi.score, 100);
}
