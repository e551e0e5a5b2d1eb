//! Record types: the payloads stored in each family.
//!
//! Everything except [`Profile`] is append-only: once written it is never
//! updated, and a correction is simply a newer record. Append-only payloads
//! are stored wrapped in [`Stamped`], which adds the write-time timestamp.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use strum::{Display, EnumIter};

use crate::{Error, Result, keys::RecordFamily};

// ─── Record trait ────────────────────────────────────────────────────────────

/// An append-only record family payload.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
  const FAMILY: RecordFamily;

  /// Reject malformed payloads before anything is written.
  fn validate(&self) -> Result<()> { Ok(()) }
}

/// A stored append-only record together with its write-time timestamp.
///
/// Serialised flat: `{"timestamp": 1700000000000, ...payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamped<R> {
  /// Milliseconds since the epoch; also embedded in the record's key.
  pub timestamp: i64,
  #[serde(flatten)]
  pub record:    R,
}

fn require(cond: bool, msg: &str) -> Result<()> {
  if cond { Ok(()) } else { Err(Error::Validation(msg.to_owned())) }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A user's health baseline. One per user, overwritten on each save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
  pub personal:             PersonalInfo,
  pub primary_diagnosis:    Option<String>,
  pub secondary_conditions: Vec<String>,
  /// Ordered as entered by the user.
  pub medications:          Vec<Medication>,
  pub providers:            Vec<Provider>,
  pub baseline:             BaselineVitals,
  pub emergency_contact:    Option<EmergencyContact>,
}

impl Profile {
  pub fn validate(&self) -> Result<()> {
    require(
      !self.personal.full_name.trim().is_empty(),
      "profile.personal.full_name is required",
    )?;
    for (i, m) in self.medications.iter().enumerate() {
      if m.name.trim().is_empty() {
        return Err(Error::Validation(format!(
          "profile.medications[{i}].name is required"
        )));
      }
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
  pub full_name:     String,
  pub date_of_birth: Option<NaiveDate>,
  pub sex:           Option<String>,
  pub height_cm:     Option<f64>,
  pub weight_kg:     Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
  pub name:      String,
  #[serde(default)]
  pub dosage:    Option<String>,
  #[serde(default)]
  pub frequency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
  pub name:      String,
  #[serde(default)]
  pub specialty: Option<String>,
  #[serde(default)]
  pub phone:     Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineVitals {
  pub systolic:    Option<f64>,
  pub diastolic:   Option<f64>,
  pub heart_rate:  Option<f64>,
  pub glucose:     Option<f64>,
  pub sleep_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
  pub name:         String,
  #[serde(default)]
  pub relationship: Option<String>,
  #[serde(default)]
  pub phone:        Option<String>,
}

// ─── Metric samples ──────────────────────────────────────────────────────────

/// A tracked health dimension.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
  BloodPressure,
  Glucose,
  HeartRate,
  MedicationAdherence,
  Sleep,
  Weight,
}

impl Dimension {
  /// Human-readable name used in alert and recommendation text.
  pub fn label(self) -> &'static str {
    match self {
      Self::BloodPressure => "Blood pressure",
      Self::Glucose => "Glucose",
      Self::HeartRate => "Heart rate",
      Self::MedicationAdherence => "Medication adherence",
      Self::Sleep => "Sleep",
      Self::Weight => "Weight",
    }
  }

  pub fn unit(self) -> &'static str {
    match self {
      Self::BloodPressure => "mmHg",
      Self::Glucose => "mg/dL",
      Self::HeartRate => "bpm",
      Self::MedicationAdherence => "%",
      Self::Sleep => "h",
      Self::Weight => "kg",
    }
  }
}

/// One observation within a [`MetricSample`]. Each variant has a fixed schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reading {
  BloodPressure { systolic: f64, diastolic: f64 },
  Glucose { mg_dl: f64 },
  HeartRate { bpm: f64 },
  MedicationAdherence { percent: f64 },
  Sleep { hours: f64 },
  Weight { kg: f64 },
}

impl Reading {
  pub fn dimension(&self) -> Dimension {
    match self {
      Self::BloodPressure { .. } => Dimension::BloodPressure,
      Self::Glucose { .. } => Dimension::Glucose,
      Self::HeartRate { .. } => Dimension::HeartRate,
      Self::MedicationAdherence { .. } => Dimension::MedicationAdherence,
      Self::Sleep { .. } => Dimension::Sleep,
      Self::Weight { .. } => Dimension::Weight,
    }
  }

  /// The scalar used for trend analysis. Blood pressure trends on systolic.
  pub fn value(&self) -> f64 {
    match *self {
      Self::BloodPressure { systolic, .. } => systolic,
      Self::Glucose { mg_dl } => mg_dl,
      Self::HeartRate { bpm } => bpm,
      Self::MedicationAdherence { percent } => percent,
      Self::Sleep { hours } => hours,
      Self::Weight { kg } => kg,
    }
  }

  fn is_plausible(&self) -> bool {
    let finite_non_negative = |v: f64| v.is_finite() && v >= 0.0;
    match *self {
      Self::BloodPressure { systolic, diastolic } => {
        finite_non_negative(systolic) && finite_non_negative(diastolic)
      }
      Self::MedicationAdherence { percent } => {
        finite_non_negative(percent) && percent <= 100.0
      }
      Self::Sleep { hours } => finite_non_negative(hours) && hours <= 24.0,
      _ => finite_non_negative(self.value()),
    }
  }
}

/// A timestamped bundle of readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
  pub readings: Vec<Reading>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub note:     Option<String>,
}

impl MetricSample {
  pub fn new(readings: Vec<Reading>) -> Self { Self { readings, note: None } }

  /// The first reading for `dimension`, if any.
  pub fn reading(&self, dimension: Dimension) -> Option<&Reading> {
    self.readings.iter().find(|r| r.dimension() == dimension)
  }
}

impl Record for MetricSample {
  const FAMILY: RecordFamily = RecordFamily::Metric;

  fn validate(&self) -> Result<()> {
    require(!self.readings.is_empty(), "metric needs at least one reading")?;
    for r in &self.readings {
      if !r.is_plausible() {
        return Err(Error::Validation(format!(
          "implausible {} reading: {}",
          r.dimension(),
          r.value()
        )));
      }
    }
    Ok(())
  }
}

// ─── Nutrition ───────────────────────────────────────────────────────────────

/// A logged meal, in the shape returned by the meal-analysis collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionEntry {
  /// kcal.
  pub calories:      f64,
  /// Grams.
  pub protein:       f64,
  /// Grams.
  pub fat:           f64,
  /// Grams.
  pub carbohydrates: f64,
  #[serde(default)]
  pub description:   String,
}

impl Record for NutritionEntry {
  const FAMILY: RecordFamily = RecordFamily::Nutrition;

  fn validate(&self) -> Result<()> {
    for (name, v) in [
      ("calories", self.calories),
      ("protein", self.protein),
      ("fat", self.fat),
      ("carbohydrates", self.carbohydrates),
    ] {
      if !v.is_finite() || v < 0.0 {
        return Err(Error::Validation(format!(
          "{name} must be a non-negative number"
        )));
      }
    }
    Ok(())
  }
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// A stored attachment; no binary data lives in the event store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
  /// Path relative to the configured attachments directory.
  pub path:         String,
  /// SHA-256 hex digest of the content.
  pub content_hash: String,
  pub media_type:   String,
  pub size_bytes:   u64,
}

/// An uploaded lab document and its derived summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
  pub file_name: String,
  #[serde(default)]
  pub file:      Option<FileRef>,
  pub summary:   String,
}

impl Record for LabResult {
  const FAMILY: RecordFamily = RecordFamily::Lab;

  fn validate(&self) -> Result<()> {
    require(!self.file_name.trim().is_empty(), "lab result needs a file name")?;
    require(!self.summary.trim().is_empty(), "lab result needs a summary")
  }
}

/// An uploaded voice recording and its derived summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceNote {
  #[serde(default)]
  pub file:       Option<FileRef>,
  #[serde(default)]
  pub transcript: Option<String>,
  pub summary:    String,
}

impl Record for VoiceNote {
  const FAMILY: RecordFamily = RecordFamily::Voice;

  fn validate(&self) -> Result<()> {
    require(!self.summary.trim().is_empty(), "voice note needs a summary")
  }
}

/// A structured SOAP note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicalNote {
  pub subjective: String,
  pub objective:  String,
  pub assessment: String,
  pub plan:       String,
  pub tags:       Vec<String>,
}

impl Record for ClinicalNote {
  const FAMILY: RecordFamily = RecordFamily::Note;

  fn validate(&self) -> Result<()> {
    let any = [&self.subjective, &self.objective, &self.assessment, &self.plan]
      .iter()
      .any(|s| !s.trim().is_empty());
    require(any, "clinical note needs at least one SOAP section")
  }
}

/// A free-text entry about the day (mood, activity, how the user feels),
/// stored as its summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNote {
  pub summary: String,
}

impl Record for TextNote {
  const FAMILY: RecordFamily = RecordFamily::Text;

  fn validate(&self) -> Result<()> {
    require(!self.summary.trim().is_empty(), "text note needs a summary")
  }
}
