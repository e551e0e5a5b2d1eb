//! Medala server: configuration and application assembly.
//!
//! The binary in `main.rs` loads a [`ServerConfig`], opens the SQLite store
//! and serves [`app`]. Everything here is reusable from tests.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use axum::Router;
use medala_api::{AppState, Attachments, attachments::DEFAULT_MAX_BYTES};
use medala_core::{config::AnalysisConfig, records::Records, store::EventStore};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MEDALA_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  pub attachments_dir:      PathBuf,
  pub store_timeout_ms:     u64,
  pub max_attachment_bytes: usize,
  pub analysis:             AnalysisConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "127.0.0.1".to_string(),
      port:                 8080,
      store_path:           PathBuf::from("~/.local/share/medala/medala.db"),
      attachments_dir:      PathBuf::from("~/.local/share/medala/attachments"),
      store_timeout_ms:     5_000,
      max_attachment_bytes: DEFAULT_MAX_BYTES,
      analysis:             AnalysisConfig::default(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store_timeout(&self) -> Duration { Duration::from_millis(self.store_timeout_ms) }

  /// Application state over `store`, with `~` expanded in file paths.
  pub fn state<S: EventStore>(&self, store: S) -> AppState<S> {
    AppState::new(
      Records::new(store.into()),
      self.analysis.clone(),
      Attachments::new(expand_tilde(&self.attachments_dir), self.max_attachment_bytes),
      self.store_timeout(),
    )
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The full HTTP application: API routes plus request tracing and CORS.
pub fn app<S>(state: AppState<S>) -> Router
where
  S: EventStore + 'static,
{
  medala_api::api_router(state)
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
}
