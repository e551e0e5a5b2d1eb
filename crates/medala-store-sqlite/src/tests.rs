//! Integration tests for `SqliteStore` against in-memory and on-disk
//! databases.

use std::sync::Arc;

use medala_core::{
  clock::ManualClock,
  keys::UserId,
  record::{MetricSample, NutritionEntry, Reading},
  records::Records,
  store::EventStore,
};
use serde_json::json;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn keys(entries: &[medala_core::store::Entry]) -> Vec<&str> {
  let mut keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
  keys.sort_unstable();
  keys
}

// ─── Key/value contract ──────────────────────────────────────────────────────

#[tokio::test]
async fn set_and_get() {
  let s = store().await;
  let value = json!({ "calories": 400.0, "tags": ["a", "b"], "nested": { "x": null } });

  s.set("nutrition:user_1:1000", value.clone()).await.unwrap();
  assert_eq!(s.get("nutrition:user_1:1000").await.unwrap(), Some(value));
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert_eq!(s.get("profile:nobody").await.unwrap(), None);
}

#[tokio::test]
async fn set_overwrites_existing_key() {
  let s = store().await;
  s.set("profile:u", json!({ "v": 1 })).await.unwrap();
  s.set("profile:u", json!({ "v": 2 })).await.unwrap();

  assert_eq!(s.get("profile:u").await.unwrap(), Some(json!({ "v": 2 })));
  assert_eq!(s.len().await.unwrap(), 1);
}

#[tokio::test]
async fn delete_reports_whether_removed() {
  let s = store().await;
  s.set("note:u:1", json!({})).await.unwrap();

  assert!(s.delete("note:u:1").await.unwrap());
  assert!(!s.delete("note:u:1").await.unwrap());
  assert_eq!(s.get("note:u:1").await.unwrap(), None);
}

// ─── Prefix scans ────────────────────────────────────────────────────────────

#[tokio::test]
async fn prefix_scan_is_exact() {
  let s = store().await;
  for key in [
    "metric:u:1",
    "metric:u:20",
    "metric:u2:1",
    "metric:v:1",
    "metrics:u:1",
    "nutrition:u:1",
    "profile:u",
  ] {
    s.set(key, json!({ "k": key })).await.unwrap();
  }

  let hits = s.get_by_prefix("metric:u:").await.unwrap();
  assert_eq!(keys(&hits), vec!["metric:u:1", "metric:u:20"]);
  for e in &hits {
    assert_eq!(e.value, json!({ "k": e.key }));
  }
}

#[tokio::test]
async fn prefix_scan_does_not_treat_like_wildcards() {
  let s = store().await;
  s.set("metric:a_b:1", json!(1)).await.unwrap();
  s.set("metric:axb:1", json!(2)).await.unwrap();
  s.set("metric:a%:1", json!(3)).await.unwrap();
  s.set("metric:az:1", json!(4)).await.unwrap();

  let underscore = s.get_by_prefix("metric:a_b:").await.unwrap();
  assert_eq!(keys(&underscore), vec!["metric:a_b:1"]);

  let percent = s.get_by_prefix("metric:a%").await.unwrap();
  assert_eq!(keys(&percent), vec!["metric:a%:1"]);
}

#[tokio::test]
async fn empty_prefix_returns_everything() {
  let s = store().await;
  s.set("a", json!(1)).await.unwrap();
  s.set("z", json!(2)).await.unwrap();
  assert_eq!(s.get_by_prefix("").await.unwrap().len(), 2);
}

#[tokio::test]
async fn prefix_scan_handles_non_ascii() {
  let s = store().await;
  s.set("note:zoë:1", json!(1)).await.unwrap();
  s.set("note:zoë2:1", json!(2)).await.unwrap();
  s.set("note:zoé:1", json!(3)).await.unwrap();

  let hits = s.get_by_prefix("note:zoë:").await.unwrap();
  assert_eq!(keys(&hits), vec!["note:zoë:1"]);
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn values_survive_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("medala.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.set("profile:u", json!({ "name": "U" })).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.get("profile:u").await.unwrap(), Some(json!({ "name": "U" })));
}

#[tokio::test]
async fn newer_schema_version_is_rejected() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("future.db");
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 99;").unwrap();
  }

  let err = SqliteStore::open(&path).await.err().expect("open must fail");
  assert!(matches!(err, Error::SchemaVersion { found: 99, .. }), "{err}");
}

// ─── Through the repository ──────────────────────────────────────────────────

#[tokio::test]
async fn records_over_sqlite_sort_numerically() {
  let clock = Arc::new(ManualClock::at(9));
  let records = Records::with_clock(Arc::new(store().await), clock.clone());
  let user = UserId::new("user_1").unwrap();

  // 9 < 10 < 100 numerically but "10" < "100" < "9" as text.
  for ts in [9, 100, 10] {
    clock.set(ts);
    records
      .append(&user, MetricSample::new(vec![Reading::HeartRate { bpm: 60.0 + ts as f64 }]))
      .await
      .unwrap();
  }

  let got: Vec<i64> = records
    .scan::<MetricSample>(&user)
    .await
    .unwrap()
    .iter()
    .map(|s| s.timestamp)
    .collect();
  assert_eq!(got, vec![100, 10, 9]);
}

#[tokio::test]
async fn same_tick_appends_collide_in_sqlite() {
  let clock = Arc::new(ManualClock::at(1_000));
  let records = Records::with_clock(Arc::new(store().await), clock);
  let user = UserId::new("user_1").unwrap();

  for calories in [400.0, 600.0] {
    records
      .append(&user, NutritionEntry {
        calories,
        protein: 0.0,
        fat: 0.0,
        carbohydrates: 0.0,
        description: String::new(),
      })
      .await
      .unwrap();
  }

  let all = records.scan::<NutritionEntry>(&user).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].record.calories, 600.0);
  assert_eq!(records.store().len().await.unwrap(), 1);
}
