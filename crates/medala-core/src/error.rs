//! Error types for `medala-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A write was rejected before touching the store.
  #[error("validation error: {0}")]
  Validation(String),

  #[error("not found: {0}")]
  NotFound(String),

  /// A derived view was requested without the data it depends on.
  #[error("precondition failed: {0}")]
  Precondition(String),

  /// The backing store failed. Callers may retry.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }

  /// Short machine-readable name of the error class.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Validation(_) => "validation",
      Self::NotFound(_) => "not_found",
      Self::Precondition(_) => "precondition",
      Self::Storage(_) => "storage",
      Self::Serialization(_) => "serialization",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
