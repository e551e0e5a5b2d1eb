//! JSON REST API for Medala.
//!
//! Exposes an axum [`Router`] backed by any [`medala_core::store::EventStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility; the
//! user id is whatever the caller puts in the path or body.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = medala_api::api_router(state).layer(TraceLayer::new_for_http());
//! ```

pub mod attachments;
pub mod error;
pub mod liveness;
pub mod profile;
pub mod records;
pub mod uploads;
pub mod views;

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use medala_core::{
  config::AnalysisConfig,
  keys::UserId,
  record::{ClinicalNote, LabResult, MetricSample, NutritionEntry, TextNote, VoiceNote},
  records::Records,
  store::EventStore,
};

pub use attachments::Attachments;
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub records:       Records<S>,
  pub analysis:      Arc<AnalysisConfig>,
  pub attachments:   Arc<Attachments>,
  /// Upper bound on any single store-backed operation.
  pub store_timeout: Duration,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      records:       self.records.clone(),
      analysis:      Arc::clone(&self.analysis),
      attachments:   Arc::clone(&self.attachments),
      store_timeout: self.store_timeout,
    }
  }
}

impl<S: EventStore> AppState<S> {
  pub fn new(
    records: Records<S>,
    analysis: AnalysisConfig,
    attachments: Attachments,
    store_timeout: Duration,
  ) -> Self {
    Self {
      records,
      analysis: Arc::new(analysis),
      attachments: Arc::new(attachments),
      store_timeout,
    }
  }

  /// Run a store-backed operation under the configured timeout.
  pub(crate) async fn bounded<T>(
    &self,
    op: impl Future<Output = medala_core::Result<T>>,
  ) -> Result<T, ApiError> {
    match tokio::time::timeout(self.store_timeout, op).await {
      Ok(result) => Ok(result?),
      Err(_) => Err(ApiError::Timeout(self.store_timeout)),
    }
  }
}

pub(crate) fn user_id(raw: String) -> Result<UserId, ApiError> { Ok(UserId::new(raw)?) }

// ─── Router ──────────────────────────────────────────────────────────────────

/// Base64 inflates by 4/3; leave room for the rest of the JSON body.
fn body_limit(max_attachment_bytes: usize) -> usize {
  max_attachment_bytes / 3 * 4 + 4 + 64 * 1024
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: EventStore + 'static,
{
  let limit = body_limit(state.attachments.max_bytes());
  Router::new()
    .route("/health", get(liveness::handler))
    // Profile
    .route("/profile", post(profile::save::<S>))
    .route("/profile/{user_id}", get(profile::get_one::<S>))
    // Append-only families
    .route("/metrics", post(records::create_metric::<S>))
    .route("/metrics/{user_id}", get(records::list::<S, MetricSample>))
    .route("/nutrition", post(records::create_nutrition::<S>))
    .route("/nutrition/{user_id}", get(records::list::<S, NutritionEntry>))
    .route("/clinical-notes", post(records::create_clinical_note::<S>))
    .route("/clinical-notes/{user_id}", get(records::list::<S, ClinicalNote>))
    .route("/text-notes", post(records::create_text_note::<S>))
    .route("/text-notes/{user_id}", get(records::list::<S, TextNote>))
    .route("/lab-results", post(uploads::create_lab_result::<S>))
    .route("/lab-results/{user_id}", get(records::list::<S, LabResult>))
    .route("/voice-notes", post(uploads::create_voice_note::<S>))
    .route("/voice-notes/{user_id}", get(records::list::<S, VoiceNote>))
    // Derived views
    .route("/users/{user_id}/daily-totals", get(views::daily_totals::<S>))
    .route("/users/{user_id}/health-index", get(views::health_index::<S>))
    .route("/users/{user_id}/food-index", get(views::food_index::<S>))
    .route("/users/{user_id}/risk-analysis", get(views::risk_analysis::<S>))
    .route("/users/{user_id}/insights", get(views::insights::<S>))
    .route("/users/{user_id}/dashboard", get(views::dashboard::<S>))
    .layer(DefaultBodyLimit::max(limit))
    .with_state(state)
}
