//! The composite health index.

use serde::{Deserialize, Serialize};

use super::{
  display_score,
  trend::{self, Trend, TrendSummary},
};
use crate::{
  config::{AnalysisConfig, DimensionPolicy, TrendPoints},
  record::{Dimension, MetricSample, Stamped},
};

/// One dimension's contribution to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
  pub dimension: Dimension,
  pub trend:     Trend,
  pub latest:    f64,
  pub deviation: f64,
  /// 0–10.
  pub index:     f64,
  pub weight:    f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthIndex {
  /// 0–10.
  pub health_index:      f64,
  /// `round(health_index * 10)`, 0–100.
  pub score:             u8,
  /// No tracked dimension had data; `health_index` is the configured neutral
  /// value.
  pub insufficient_data: bool,
  pub samples:           usize,
  pub dimensions:        Vec<DimensionScore>,
}

fn trend_points(trend: Trend, points: &TrendPoints) -> f64 {
  match trend {
    Trend::Improving => points.improving,
    Trend::Stable => points.stable,
    Trend::Declining => points.declining,
  }
}

fn level(deviation: f64, policy: &DimensionPolicy) -> f64 {
  if policy.severity_span <= 0.0 {
    return if deviation == 0.0 { 10.0 } else { 0.0 };
  }
  10.0 * (1.0 - (deviation / policy.severity_span).min(1.0))
}

fn dimension_score(summary: &TrendSummary, cfg: &AnalysisConfig) -> DimensionScore {
  let policy = cfg.dimensions.get(summary.dimension);
  let tw = cfg.trend.trend_weight.clamp(0.0, 1.0);
  let index = (1.0 - tw) * level(summary.latest_deviation, policy)
    + tw * trend_points(summary.trend, &cfg.trend.points);

  DimensionScore {
    dimension: summary.dimension,
    trend:     summary.trend,
    latest:    summary.latest.value,
    deviation: summary.latest_deviation,
    index:     index.clamp(0.0, 10.0),
    weight:    policy.weight,
  }
}

/// Fold an already-selected window (oldest first) into an index.
pub(crate) fn score_window(
  window: &[&Stamped<MetricSample>],
  cfg: &AnalysisConfig,
) -> HealthIndex {
  let dimensions: Vec<DimensionScore> = trend::summaries(window, cfg)
    .iter()
    .map(|s| dimension_score(s, cfg))
    .collect();

  let total_weight: f64 = dimensions.iter().map(|d| d.weight.max(0.0)).sum();
  let (health_index, insufficient_data) = if total_weight > 0.0 {
    let weighted: f64 = dimensions.iter().map(|d| d.weight.max(0.0) * d.index).sum();
    ((weighted / total_weight).clamp(0.0, 10.0), false)
  } else {
    (cfg.neutral_index, true)
  };

  HealthIndex {
    health_index,
    score: display_score(health_index),
    insufficient_data,
    samples: window.len(),
    dimensions,
  }
}

/// Health index over the newest `index_sample_limit` metric samples.
pub fn health_index(samples: &[Stamped<MetricSample>], cfg: &AnalysisConfig) -> HealthIndex {
  score_window(&trend::newest(samples, cfg.index_sample_limit), cfg)
}
