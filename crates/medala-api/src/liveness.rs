//! `GET /health`: liveness probe. Does not touch the store.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Status {
  pub status:    &'static str,
  pub timestamp: DateTime<Utc>,
}

pub async fn handler() -> Json<Status> {
  Json(Status { status: "ok", timestamp: Utc::now() })
}
