//! Handlers for the derived views under `/users/{user_id}`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users/{user_id}/daily-totals` | `?date=YYYY-MM-DD`; defaults to today (server local time) |
//! | `GET`  | `/users/{user_id}/health-index` | |
//! | `GET`  | `/users/{user_id}/food-index` | |
//! | `GET`  | `/users/{user_id}/risk-analysis` | 404 with kind `precondition` without a profile |
//! | `GET`  | `/users/{user_id}/insights` | Counts of logged meals, lab results and text notes |
//! | `GET`  | `/users/{user_id}/dashboard` | All four views; each succeeds or fails on its own |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{Local, NaiveDate};
use medala_core::{
  aggregate::{DailyTotals, DayWindow, FoodIndex, HealthIndex, Insights, RiskAnalysis},
  keys::UserId,
  store::EventStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, user_id};

fn day_window(date: Option<NaiveDate>) -> DayWindow {
  match date {
    Some(date) => DayWindow::for_date(date, &Local),
    None => DayWindow::containing(&Local::now()),
  }
}

async fn totals_for<S: EventStore>(
  state: &AppState<S>,
  user: &UserId,
  day: &DayWindow,
) -> Result<DailyTotals, ApiError> {
  state.bounded(state.records.daily_totals(user, day)).await
}

async fn health_for<S: EventStore>(
  state: &AppState<S>,
  user: &UserId,
) -> Result<HealthIndex, ApiError> {
  state.bounded(state.records.health_index(user, &state.analysis)).await
}

async fn food_for<S: EventStore>(state: &AppState<S>, user: &UserId) -> Result<FoodIndex, ApiError> {
  state
    .bounded(state.records.food_index(user, &Local::now(), &state.analysis))
    .await
}

async fn risk_for<S: EventStore>(
  state: &AppState<S>,
  user: &UserId,
) -> Result<RiskAnalysis, ApiError> {
  state.bounded(state.records.risk_analysis(user, &state.analysis)).await
}

// ─── Single views ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct DayParams {
  pub date: Option<NaiveDate>,
}

/// `GET /users/{user_id}/daily-totals[?date=YYYY-MM-DD]`
pub async fn daily_totals<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
  Query(params): Query<DayParams>,
) -> Result<Json<DailyTotals>, ApiError> {
  let user = user_id(raw)?;
  Ok(Json(totals_for(&state, &user, &day_window(params.date)).await?))
}

/// `GET /users/{user_id}/health-index`
pub async fn health_index<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
) -> Result<Json<HealthIndex>, ApiError> {
  let user = user_id(raw)?;
  Ok(Json(health_for(&state, &user).await?))
}

/// `GET /users/{user_id}/food-index`
pub async fn food_index<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
) -> Result<Json<FoodIndex>, ApiError> {
  let user = user_id(raw)?;
  Ok(Json(food_for(&state, &user).await?))
}

/// `GET /users/{user_id}/risk-analysis`
pub async fn risk_analysis<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
) -> Result<Json<RiskAnalysis>, ApiError> {
  let user = user_id(raw)?;
  Ok(Json(risk_for(&state, &user).await?))
}

/// `GET /users/{user_id}/insights`
pub async fn insights<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
) -> Result<Json<Insights>, ApiError> {
  let user = user_id(raw)?;
  Ok(Json(state.bounded(state.records.insights(&user)).await?))
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ViewError {
  pub error: String,
  pub kind:  &'static str,
}

/// One slot of the dashboard: `{"ok": ...}` or `{"error": {...}}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewResult<T> {
  Ok(T),
  Error(ViewError),
}

impl<T> From<Result<T, ApiError>> for ViewResult<T> {
  fn from(r: Result<T, ApiError>) -> Self {
    match r {
      Ok(v) => ViewResult::Ok(v),
      Err(e) => {
        tracing::debug!(error = %e, "dashboard view failed");
        ViewResult::Error(ViewError { error: e.to_string(), kind: e.kind() })
      }
    }
  }
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
  pub user_id:       UserId,
  pub daily_totals:  ViewResult<DailyTotals>,
  pub health_index:  ViewResult<HealthIndex>,
  pub food_index:    ViewResult<FoodIndex>,
  pub risk_analysis: ViewResult<RiskAnalysis>,
}

/// `GET /users/{user_id}/dashboard`
///
/// The four views are computed concurrently. A failing view is reported in
/// its own slot; the response is still 200.
pub async fn dashboard<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(raw): Path<String>,
) -> Result<Json<Dashboard>, ApiError> {
  let user = user_id(raw)?;
  let day = day_window(None);

  let (totals, health, food, risk) = tokio::join!(
    totals_for(&state, &user, &day),
    health_for(&state, &user),
    food_for(&state, &user),
    risk_for(&state, &user),
  );

  Ok(Json(Dashboard {
    user_id:       user,
    daily_totals:  totals.into(),
    health_index:  health.into(),
    food_index:    food.into(),
    risk_analysis: risk.into(),
  }))
}
