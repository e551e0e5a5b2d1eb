//! Handlers for the append-only record families.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/metrics` | Body: `{"user_id", "metric": {"readings": [...]}}` |
//! | `POST` | `/nutrition` | Body: `{"user_id", "entry": {"calories", "protein", "fat", "carbohydrates", "description"}}` |
//! | `POST` | `/clinical-notes` | Body: `{"user_id", "note": {"subjective", ...}}` |
//! | `POST` | `/text-notes` | Body: `{"user_id", "summary"}` |
//! | `GET`  | `/{family}/{user_id}` | `?limit&offset`; newest first |
//!
//! Lab results and voice notes carry attachments; see [`crate::uploads`].

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use medala_core::{
  record::{ClinicalNote, MetricSample, NutritionEntry, Record, Stamped, TextNote},
  records::Page,
  store::EventStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError, user_id};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /{family}/{user_id}[?limit=<n>][&offset=<n>]`
pub async fn list<S, R>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
  Query(page): Query<Page>,
) -> Result<Json<Vec<Stamped<R>>>, ApiError>
where
  S: EventStore,
  R: Record,
{
  let user = user_id(raw)?;
  let records = state.bounded(state.records.list::<R>(&user, page)).await?;
  Ok(Json(records))
}

// ─── Create ──────────────────────────────────────────────────────────────────

pub(crate) async fn append<S, R>(
  state: &AppState<S>,
  raw_user: String,
  record: R,
) -> Result<(StatusCode, Json<Stamped<R>>), ApiError>
where
  S: EventStore,
  R: Record,
{
  let user = user_id(raw_user)?;
  let stamped = state.bounded(state.records.append(&user, record)).await?;
  tracing::debug!(%user, family = %R::FAMILY, timestamp = stamped.timestamp, "appended record");
  Ok((StatusCode::CREATED, Json(stamped)))
}

#[derive(Debug, Deserialize)]
pub struct MetricBody {
  pub user_id: String,
  pub metric:  MetricSample,
}

/// `POST /metrics`
pub async fn create_metric<S: EventStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<MetricBody>,
) -> Result<(StatusCode, Json<Stamped<MetricSample>>), ApiError> {
  append(&state, body.user_id, body.metric).await
}

#[derive(Debug, Deserialize)]
pub struct NutritionBody {
  pub user_id: String,
  pub entry:   NutritionEntry,
}

/// `POST /nutrition`
pub async fn create_nutrition<S: EventStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<NutritionBody>,
) -> Result<(StatusCode, Json<Stamped<NutritionEntry>>), ApiError> {
  append(&state, body.user_id, body.entry).await
}

#[derive(Debug, Deserialize)]
pub struct ClinicalNoteBody {
  pub user_id: String,
  pub note:    ClinicalNote,
}

/// `POST /clinical-notes`
pub async fn create_clinical_note<S: EventStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<ClinicalNoteBody>,
) -> Result<(StatusCode, Json<Stamped<ClinicalNote>>), ApiError> {
  append(&state, body.user_id, body.note).await
}

#[derive(Debug, Deserialize)]
pub struct TextNoteBody {
  pub user_id: String,
  #[serde(flatten)]
  pub note:    TextNote,
}

/// `POST /text-notes`
pub async fn create_text_note<S: EventStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<TextNoteBody>,
) -> Result<(StatusCode, Json<Stamped<TextNote>>), ApiError> {
  append(&state, body.user_id, body.note).await
}
