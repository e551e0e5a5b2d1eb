//! A plain summary of how much a user has logged so far.

use serde::{Deserialize, Serialize};

const GETTING_STARTED: &str = "Start logging your meals, health notes, and lab results to \
                               receive personalized health insights.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
  pub summary:      String,
  pub meals:        usize,
  pub lab_results:  usize,
  pub health_notes: usize,
}

/// Build the summary from per-family record counts.
pub fn insights(meals: usize, lab_results: usize, health_notes: usize) -> Insights {
  let summary = if meals + lab_results + health_notes == 0 {
    GETTING_STARTED.to_owned()
  } else {
    format!(
      "You have logged {meals} meals, {lab_results} lab results, and {health_notes} health \
       notes. Continue logging your data for personalized insights."
    )
  };
  Insights { summary, meals, lab_results, health_notes }
}
