//! Write-time timestamps for append-only records.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Source of the millisecond timestamps embedded in record keys.
pub trait Clock: Send + Sync {
  /// Milliseconds since the Unix epoch.
  fn now_millis(&self) -> i64;
}

/// Wall-clock time, never going backwards for a given instance.
///
/// If the system clock steps back, the last issued value is repeated instead,
/// so keys stay non-decreasing. Repeats share a key with the previous write.
#[derive(Debug, Default)]
pub struct SystemClock {
  last: AtomicI64,
}

impl SystemClock {
  pub fn new() -> Self { Self::default() }
}

impl Clock for SystemClock {
  fn now_millis(&self) -> i64 {
    let now = Utc::now().timestamp_millis();
    let prev = self.last.fetch_max(now, Ordering::SeqCst);
    prev.max(now)
  }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
  now: AtomicI64,
}

impl ManualClock {
  pub fn at(millis: i64) -> Self { Self { now: AtomicI64::new(millis) } }

  pub fn set(&self, millis: i64) { self.now.store(millis, Ordering::SeqCst); }

  pub fn advance(&self, millis: i64) {
    self.now.fetch_add(millis, Ordering::SeqCst);
  }
}

impl Clock for ManualClock {
  fn now_millis(&self) -> i64 { self.now.load(Ordering::SeqCst) }
}
