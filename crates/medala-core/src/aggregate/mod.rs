//! Derived views over a snapshot of a user's records.
//!
//! Every function here is pure: it takes the records a scan returned (in any
//! order), the thresholds from [`AnalysisConfig`](crate::config::AnalysisConfig),
//! and folds them into a fresh view. Nothing is cached between calls.

pub mod health;
pub mod insights;
pub mod nutrition;
pub mod risk;
pub mod trend;

pub use health::{DimensionScore, HealthIndex, health_index};
pub use insights::{Insights, insights};
pub use nutrition::{DailyTotals, DayWindow, FoodIndex, daily_totals, food_index};
pub use risk::{Alert, AlertSeverity, RiskAnalysis, RiskLevel, analyze};
pub use trend::{Trend, TrendSummary};

/// Map a 0–10 index onto the 0–100 display score.
pub fn display_score(index: f64) -> u8 {
  (index * 10.0).round().clamp(0.0, 100.0) as u8
}
