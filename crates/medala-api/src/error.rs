//! API error type and [`axum::response::IntoResponse`] implementation.

use std::time::Duration;

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] medala_core::Error),

  /// Writing an uploaded attachment to disk failed.
  #[error("attachment storage error: {0}")]
  Attachment(#[source] std::io::Error),

  #[error("store did not answer within {0:?}")]
  Timeout(Duration),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    use medala_core::Error as E;
    match self {
      ApiError::Core(E::Validation(_)) => StatusCode::BAD_REQUEST,
      ApiError::Core(E::NotFound(_) | E::Precondition(_)) => StatusCode::NOT_FOUND,
      ApiError::Core(E::Storage(_)) | ApiError::Attachment(_) => {
        StatusCode::SERVICE_UNAVAILABLE
      }
      ApiError::Core(E::Serialization(_)) => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      ApiError::Core(e) => e.kind(),
      ApiError::Attachment(_) => "storage",
      ApiError::Timeout(_) => "timeout",
    }
  }

  fn log(&self) {
    match self.status() {
      StatusCode::INTERNAL_SERVER_ERROR => tracing::error!(error = %self, "request failed"),
      s if s.is_server_error() => tracing::warn!(error = %self, kind = self.kind(), "request failed"),
      _ => tracing::debug!(error = %self, "request rejected"),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    self.log();
    let body = Json(json!({ "error": self.to_string(), "kind": self.kind() }));
    (self.status(), body).into_response()
  }
}
