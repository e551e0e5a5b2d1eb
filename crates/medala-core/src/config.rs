//! Tunable thresholds for the aggregation engine.
//!
//! Every number the engine compares against lives here so deployments can
//! adjust them from the server config file (`[analysis]` table). All fields
//! have defaults; a partial table only overrides what it names.

use serde::{Deserialize, Deserializer, Serialize};

use crate::record::Dimension;

/// Root configuration for [`crate::aggregate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
  pub trend:               TrendPolicy,
  pub alerts:              AlertPolicy,
  pub dimensions:          DimensionPolicies,
  pub macros:              MacroTargets,
  /// Index reported when there is no data to fold (0–10 scale).
  pub neutral_index:       f64,
  /// How many of the newest metric samples feed the health index.
  pub index_sample_limit:  usize,
  /// How many of the newest metric samples feed a risk analysis.
  pub risk_sample_limit:   usize,
  /// Days of nutrition history (including today) behind the food index.
  pub food_lookback_days:  u32,
  /// Display scores below this are high risk.
  pub high_risk_below:     u8,
  /// Display scores below this are at least moderate risk.
  pub moderate_risk_below: u8,
}

impl Default for AnalysisConfig {
  fn default() -> Self {
    Self {
      trend:               TrendPolicy::default(),
      alerts:              AlertPolicy::default(),
      dimensions:          DimensionPolicies::default(),
      macros:              MacroTargets::default(),
      neutral_index:       5.0,
      index_sample_limit:  14,
      risk_sample_limit:   7,
      food_lookback_days:  7,
      high_risk_below:     60,
      moderate_risk_below: 80,
    }
  }
}

/// How a per-dimension series is split and scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendPolicy {
  /// Rolling window length; the latest window is compared to the one before.
  pub window:       usize,
  /// Share of a dimension's index that comes from its trend (rest is level).
  pub trend_weight: f64,
  pub points:       TrendPoints,
}

impl Default for TrendPolicy {
  fn default() -> Self {
    Self { window: 3, trend_weight: 0.4, points: TrendPoints::default() }
  }
}

/// Index points (0–10) awarded per trend classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendPoints {
  pub improving: f64,
  pub stable:    f64,
  pub declining: f64,
}

impl Default for TrendPoints {
  fn default() -> Self { Self { improving: 10.0, stable: 7.0, declining: 2.0 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicy {
  /// A declining dimension escalates to critical once this many consecutive
  /// readings worsened, or stayed outside the target band.
  pub critical_streak:      usize,
  /// Raise an info alert when the latest reading is out of band even though
  /// the dimension is not declining.
  pub alert_on_out_of_band: bool,
  /// Appended to recommendations when any alert is critical.
  pub critical_follow_up:   String,
}

impl Default for AlertPolicy {
  fn default() -> Self {
    Self {
      critical_streak:      3,
      alert_on_out_of_band: true,
      critical_follow_up:   "Recommend a follow-up with your care provider within 2-4 weeks"
        .into(),
    }
  }
}

/// Target band and scoring parameters for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionPolicy {
  /// Whether the dimension contributes to the health index and risk analysis.
  #[serde(default = "default_true")]
  pub tracked:       bool,
  pub weight:        f64,
  /// Acceptable band, inclusive. Readings inside it have zero deviation.
  pub target_low:    f64,
  pub target_high:   f64,
  /// Mean-deviation change (in the dimension's unit) treated as noise.
  pub tolerance:     f64,
  /// Deviation at which the level component bottoms out at 0.
  pub severity_span: f64,
}

fn default_true() -> bool { true }

impl DimensionPolicy {
  fn new(weight: f64, band: (f64, f64), tolerance: f64, severity_span: f64) -> Self {
    Self {
      tracked: true,
      weight,
      target_low: band.0,
      target_high: band.1,
      tolerance,
      severity_span,
    }
  }

  /// Distance of `value` outside the target band; 0 when inside.
  pub fn deviation(&self, value: f64) -> f64 {
    if value < self.target_low {
      self.target_low - value
    } else if value > self.target_high {
      value - self.target_high
    } else {
      0.0
    }
  }
}

/// Per-dimension policies. Each table deserialises over that dimension's own
/// default, so `[analysis.dimensions.glucose] tolerance = 5` keeps the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionPolicies {
  pub blood_pressure:       DimensionPolicy,
  pub glucose:              DimensionPolicy,
  pub heart_rate:           DimensionPolicy,
  pub medication_adherence: DimensionPolicy,
  pub sleep:                DimensionPolicy,
  pub weight:               DimensionPolicy,
}

impl Default for DimensionPolicies {
  fn default() -> Self {
    let mut weight = DimensionPolicy::new(0.0, (0.0, f64::MAX), 1.0, 10.0);
    weight.tracked = false;
    Self {
      blood_pressure:       DimensionPolicy::new(0.3, (90.0, 120.0), 5.0, 40.0),
      glucose:              DimensionPolicy::new(0.25, (70.0, 140.0), 10.0, 80.0),
      heart_rate:           DimensionPolicy::new(0.1, (60.0, 100.0), 5.0, 40.0),
      medication_adherence: DimensionPolicy::new(0.2, (90.0, 100.0), 5.0, 50.0),
      sleep:                DimensionPolicy::new(0.15, (7.0, 9.0), 0.5, 4.0),
      weight,
    }
  }
}

impl<'de> Deserialize<'de> for DimensionPolicies {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let patch = DimensionPoliciesPatch::deserialize(deserializer)?;
    let mut out = Self::default();
    patch.blood_pressure.apply(&mut out.blood_pressure);
    patch.glucose.apply(&mut out.glucose);
    patch.heart_rate.apply(&mut out.heart_rate);
    patch.medication_adherence.apply(&mut out.medication_adherence);
    patch.sleep.apply(&mut out.sleep);
    patch.weight.apply(&mut out.weight);
    Ok(out)
  }
}

impl DimensionPolicies {
  pub fn get(&self, dimension: Dimension) -> &DimensionPolicy {
    match dimension {
      Dimension::BloodPressure => &self.blood_pressure,
      Dimension::Glucose => &self.glucose,
      Dimension::HeartRate => &self.heart_rate,
      Dimension::MedicationAdherence => &self.medication_adherence,
      Dimension::Sleep => &self.sleep,
      Dimension::Weight => &self.weight,
    }
  }
}

/// Inclusive daily range for one macro, with its share of the food index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroRange {
  pub low:    f64,
  pub high:   f64,
  pub weight: f64,
}

impl MacroRange {
  /// 10 inside the range, falling linearly to 0 at one `high` away from it.
  pub fn score(&self, value: f64) -> f64 {
    let distance = if value < self.low {
      self.low - value
    } else if value > self.high {
      value - self.high
    } else {
      0.0
    };
    if self.high <= 0.0 {
      return if distance == 0.0 { 10.0 } else { 0.0 };
    }
    10.0 * (1.0 - distance / self.high).max(0.0)
  }
}

/// Daily macro ranges; partial tables overlay each macro's default like
/// [`DimensionPolicies`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroTargets {
  pub calories:      MacroRange,
  pub protein:       MacroRange,
  pub fat:           MacroRange,
  pub carbohydrates: MacroRange,
}

impl Default for MacroTargets {
  fn default() -> Self {
    Self {
      calories:      MacroRange { low: 1800.0, high: 2500.0, weight: 0.4 },
      protein:       MacroRange { low: 50.0, high: 150.0, weight: 0.2 },
      fat:           MacroRange { low: 44.0, high: 78.0, weight: 0.2 },
      carbohydrates: MacroRange { low: 225.0, high: 325.0, weight: 0.2 },
    }
  }
}

impl<'de> Deserialize<'de> for MacroTargets {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let patch = MacroTargetsPatch::deserialize(deserializer)?;
    let mut out = Self::default();
    patch.calories.apply(&mut out.calories);
    patch.protein.apply(&mut out.protein);
    patch.fat.apply(&mut out.fat);
    patch.carbohydrates.apply(&mut out.carbohydrates);
    Ok(out)
  }
}

// ─── Partial tables ──────────────────────────────────────────────────────────

#[derive(Default, Deserialize)]
#[serde(default)]
struct DimensionPatch {
  tracked:       Option<bool>,
  weight:        Option<f64>,
  target_low:    Option<f64>,
  target_high:   Option<f64>,
  tolerance:     Option<f64>,
  severity_span: Option<f64>,
}

impl DimensionPatch {
  fn apply(self, base: &mut DimensionPolicy) {
    if let Some(v) = self.tracked {
      base.tracked = v;
    }
    if let Some(v) = self.weight {
      base.weight = v;
    }
    if let Some(v) = self.target_low {
      base.target_low = v;
    }
    if let Some(v) = self.target_high {
      base.target_high = v;
    }
    if let Some(v) = self.tolerance {
      base.tolerance = v;
    }
    if let Some(v) = self.severity_span {
      base.severity_span = v;
    }
  }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct DimensionPoliciesPatch {
  blood_pressure:       DimensionPatch,
  glucose:              DimensionPatch,
  heart_rate:           DimensionPatch,
  medication_adherence: DimensionPatch,
  sleep:                DimensionPatch,
  weight:               DimensionPatch,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct MacroPatch {
  low:    Option<f64>,
  high:   Option<f64>,
  weight: Option<f64>,
}

impl MacroPatch {
  fn apply(self, base: &mut MacroRange) {
    if let Some(v) = self.low {
      base.low = v;
    }
    if let Some(v) = self.high {
      base.high = v;
    }
    if let Some(v) = self.weight {
      base.weight = v;
    }
  }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct MacroTargetsPatch {
  calories:      MacroPatch,
  protein:       MacroPatch,
  fat:           MacroPatch,
  carbohydrates: MacroPatch,
}
