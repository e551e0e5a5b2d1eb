//! Per-dimension trend classification.
//!
//! A dimension's readings are turned into deviations from its target band
//! (0 inside the band). The mean deviation of the latest window is compared
//! with the mean of the window just before it.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;

use crate::{
  config::{AnalysisConfig, DimensionPolicy},
  record::{Dimension, MetricSample, Stamped},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
  Improving,
  Stable,
  Declining,
}

/// One reading of one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
  pub timestamp: i64,
  pub value:     f64,
}

/// Everything the index and risk folds need to know about one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
  pub dimension:          Dimension,
  pub trend:              Trend,
  pub latest:             Point,
  pub latest_deviation:   f64,
  /// Mean of the raw values considered.
  pub mean:               f64,
  /// Consecutive readings, counted back from the latest, whose deviation was
  /// strictly greater than the reading before.
  pub worsening_streak:   usize,
  /// Consecutive readings, counted back from the latest, outside the band.
  pub out_of_band_streak: usize,
  pub readings:           usize,
}

/// The newest `limit` samples, oldest first.
pub fn newest(
  samples: &[Stamped<MetricSample>],
  limit: usize,
) -> Vec<&Stamped<MetricSample>> {
  let mut sorted: Vec<_> = samples.iter().collect();
  sorted.sort_by_key(|s| std::cmp::Reverse(s.timestamp));
  sorted.truncate(limit);
  sorted.reverse();
  sorted
}

/// Readings for `dimension`, in the order of `window` (oldest first).
pub fn series(window: &[&Stamped<MetricSample>], dimension: Dimension) -> Vec<Point> {
  window
    .iter()
    .filter_map(|s| {
      s.record.reading(dimension).map(|r| Point {
        timestamp: s.timestamp,
        value:     r.value(),
      })
    })
    .collect()
}

fn mean(values: &[f64]) -> f64 {
  if values.is_empty() {
    return 0.0;
  }
  values.iter().sum::<f64>() / values.len() as f64
}

/// Classify a chronological series of deviations.
///
/// The effective window is `min(window, n / 2)`; with fewer than two values
/// there is nothing to compare and the result is [`Trend::Stable`]. A change
/// of exactly `tolerance` is still stable.
pub fn classify(deviations: &[f64], tolerance: f64, window: usize) -> Trend {
  let n = deviations.len();
  let w = window.min(n / 2);
  if w == 0 {
    return Trend::Stable;
  }
  let current = mean(&deviations[n - w..]);
  let prior = mean(&deviations[n - 2 * w..n - w]);
  let delta = current - prior;
  if delta > tolerance {
    Trend::Declining
  } else if delta < -tolerance {
    Trend::Improving
  } else {
    Trend::Stable
  }
}

fn worsening_streak(deviations: &[f64]) -> usize {
  deviations
    .windows(2)
    .rev()
    .take_while(|pair| pair[1] > pair[0])
    .count()
}

fn out_of_band_streak(deviations: &[f64]) -> usize {
  deviations.iter().rev().take_while(|d| **d > 0.0).count()
}

/// Summarise one dimension. Returns `None` when it has no readings.
pub fn summarize(
  dimension: Dimension,
  points: &[Point],
  policy: &DimensionPolicy,
  window: usize,
) -> Option<TrendSummary> {
  let latest = *points.last()?;
  let deviations: Vec<f64> = points.iter().map(|p| policy.deviation(p.value)).collect();
  let values: Vec<f64> = points.iter().map(|p| p.value).collect();

  Some(TrendSummary {
    dimension,
    trend: classify(&deviations, policy.tolerance, window),
    latest,
    latest_deviation: policy.deviation(latest.value),
    mean: mean(&values),
    worsening_streak: worsening_streak(&deviations),
    out_of_band_streak: out_of_band_streak(&deviations),
    readings: points.len(),
  })
}

/// Summaries for every tracked dimension that has data in `window`, in
/// [`Dimension`] order.
pub fn summaries(
  window: &[&Stamped<MetricSample>],
  cfg: &AnalysisConfig,
) -> Vec<TrendSummary> {
  Dimension::iter()
    .filter(|d| cfg.dimensions.get(*d).tracked)
    .filter_map(|d| {
      let points = series(window, d);
      summarize(d, &points, cfg.dimensions.get(d), cfg.trend.window)
    })
    .collect()
}
