//! Handlers for `/profile` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/profile` | Body: `{"user_id": "...", "profile": {...}}`; overwrites |
//! | `GET`  | `/profile/{user_id}` | 404 if the user never saved one |

use axum::{
  Json,
  extract::{Path, State},
};
use medala_core::{record::Profile, store::EventStore};
use serde::Deserialize;

use crate::{AppState, error::ApiError, user_id};

#[derive(Debug, Deserialize)]
pub struct SaveBody {
  pub user_id: String,
  pub profile: Profile,
}

/// `POST /profile`
pub async fn save<S: EventStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<SaveBody>,
) -> Result<Json<Profile>, ApiError> {
  let user = user_id(body.user_id)?;
  let profile = state.bounded(state.records.save_profile(&user, body.profile)).await?;
  tracing::info!(%user, "saved profile");
  Ok(Json(profile))
}

/// `GET /profile/{user_id}`
pub async fn get_one<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
) -> Result<Json<Profile>, ApiError> {
  let user = user_id(raw)?;
  let profile = state.bounded(state.records.profile(&user)).await?;
  Ok(Json(profile))
}
