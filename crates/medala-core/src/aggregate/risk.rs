//! Risk analysis: trend labels, alerts and recommendations.
//!
//! Requires the user's [`Profile`]; the caller is responsible for failing with
//! a precondition error when there is none (see
//! [`crate::records::Records::risk_analysis`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
  health::score_window,
  trend::{self, Trend, TrendSummary},
};
use crate::{
  config::{AnalysisConfig, DimensionPolicy},
  record::{Dimension, MetricSample, Profile, Stamped},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
  Low,
  Moderate,
  High,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
  Info,
  Warning,
  Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
  pub severity:  AlertSeverity,
  pub dimension: Dimension,
  pub message:   String,
  /// Timestamp of the newest reading that triggered the alert.
  pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
  pub risk_level:             RiskLevel,
  pub health_stability_score: u8,
  pub trends:                 BTreeMap<Dimension, Trend>,
  /// Most severe first.
  pub alerts:                 Vec<Alert>,
  pub recommendations:        Vec<String>,
  pub samples:                usize,
}

fn fmt_value(dimension: Dimension, v: f64) -> String {
  match dimension {
    Dimension::Sleep | Dimension::Weight => format!("{v:.1}"),
    _ => format!("{v:.0}"),
  }
}

fn band(dimension: Dimension, policy: &DimensionPolicy) -> String {
  format!(
    "{}-{} {}",
    fmt_value(dimension, policy.target_low),
    fmt_value(dimension, policy.target_high),
    dimension.unit()
  )
}

fn alert_for(s: &TrendSummary, cfg: &AnalysisConfig) -> Option<Alert> {
  let d = s.dimension;
  let policy = cfg.dimensions.get(d);
  let latest = format!("{} {}", fmt_value(d, s.latest.value), d.unit());
  let streak = cfg.alerts.critical_streak.max(1);

  let (severity, message) = match s.trend {
    Trend::Declining if s.out_of_band_streak >= streak => (
      AlertSeverity::Critical,
      format!(
        "{} has remained outside the recommended range ({}) for {} consecutive readings (latest {latest})",
        d.label(),
        band(d, policy),
        s.out_of_band_streak,
      ),
    ),
    Trend::Declining if s.worsening_streak >= streak => (
      AlertSeverity::Critical,
      format!(
        "{} has worsened over {} consecutive readings (latest {latest})",
        d.label(),
        s.worsening_streak,
      ),
    ),
    Trend::Declining => (
      AlertSeverity::Warning,
      format!("{} is trending away from target (latest {latest})", d.label()),
    ),
    _ if cfg.alerts.alert_on_out_of_band && s.latest_deviation > 0.0 => (
      AlertSeverity::Info,
      format!(
        "{} is outside the recommended range ({}) (latest {latest})",
        d.label(),
        band(d, policy),
      ),
    ),
    _ => return None,
  };

  Some(Alert { severity, dimension: d, message, timestamp: s.latest.timestamp })
}

fn recommendation_for(s: &TrendSummary, profile: &Profile, cfg: &AnalysisConfig) -> String {
  let d = s.dimension;
  let policy = cfg.dimensions.get(d);
  match d {
    Dimension::MedicationAdherence => {
      let mut line = if s.latest.value < policy.target_low {
        format!(
          "Medication adherence at {}% - below recommended {}% threshold",
          fmt_value(d, s.latest.value),
          fmt_value(d, policy.target_low),
        )
      } else {
        format!(
          "Medication adherence averaging {}% over the last {} readings (latest {}%, target: {})",
          fmt_value(d, s.mean),
          s.readings,
          fmt_value(d, s.latest.value),
          band(d, policy),
        )
      };
      if !profile.medications.is_empty() {
        let names: Vec<&str> = profile.medications.iter().map(|m| m.name.as_str()).collect();
        line.push_str(&format!(" (review: {})", names.join(", ")));
      }
      line
    }
    Dimension::Sleep => format!(
      "Sleep averaging {} hours (target: {}-{} hours)",
      fmt_value(d, s.mean),
      fmt_value(d, policy.target_low),
      fmt_value(d, policy.target_high),
    ),
    _ => format!(
      "{} averaging {} {} over the last {} readings (target: {})",
      d.label(),
      fmt_value(d, s.mean),
      d.unit(),
      s.readings,
      band(d, policy),
    ),
  }
}

fn risk_level(alerts: &[Alert], score: u8, score_known: bool, cfg: &AnalysisConfig) -> RiskLevel {
  let worst = alerts.iter().map(|a| a.severity).max();
  if worst == Some(AlertSeverity::Critical) || (score_known && score < cfg.high_risk_below) {
    RiskLevel::High
  } else if worst == Some(AlertSeverity::Warning)
    || (score_known && score < cfg.moderate_risk_below)
  {
    RiskLevel::Moderate
  } else {
    RiskLevel::Low
  }
}

/// Analyse the newest `risk_sample_limit` metric samples for `profile`'s
/// owner. `samples` may be in any order.
pub fn analyze(
  profile: &Profile,
  samples: &[Stamped<MetricSample>],
  cfg: &AnalysisConfig,
) -> RiskAnalysis {
  let window = trend::newest(samples, cfg.risk_sample_limit);
  let summaries = trend::summaries(&window, cfg);
  let health = score_window(&window, cfg);

  let mut flagged: Vec<(Alert, &TrendSummary)> = summaries
    .iter()
    .filter_map(|s| alert_for(s, cfg).map(|a| (a, s)))
    .collect();
  flagged.sort_by(|(a, _), (b, _)| {
    b.severity.cmp(&a.severity).then(a.dimension.cmp(&b.dimension))
  });

  let mut recommendations: Vec<String> = flagged
    .iter()
    .map(|(_, s)| recommendation_for(s, profile, cfg))
    .collect();
  let alerts: Vec<Alert> = flagged.into_iter().map(|(a, _)| a).collect();

  if alerts.iter().any(|a| a.severity == AlertSeverity::Critical)
    && !cfg.alerts.critical_follow_up.is_empty()
  {
    recommendations.push(cfg.alerts.critical_follow_up.clone());
  }

  RiskAnalysis {
    risk_level: risk_level(&alerts, health.score, !health.insufficient_data, cfg),
    health_stability_score: health.score,
    trends: summaries.iter().map(|s| (s.dimension, s.trend)).collect(),
    alerts,
    recommendations,
    samples: window.len(),
  }
}
