//! Handlers for records that may carry an uploaded file.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/lab-results` | Body: `{"user_id", "file_name", "file_data"?, "summary"}` |
//! | `POST` | `/voice-notes` | Body: `{"user_id", "audio_data"?, "transcript"?, "summary"}` |
//!
//! `file_data` / `audio_data` are base64 (bare or as a `data:` URL). The
//! record is validated before anything is written to disk.

use axum::{Json, extract::State, http::StatusCode};
use medala_core::{
  record::{LabResult, Record, Stamped, VoiceNote},
  store::EventStore,
};
use serde::Deserialize;

use crate::{
  AppState,
  attachments::{LAB_DOCUMENT, VOICE_RECORDING},
  error::ApiError,
  records::append,
  user_id,
};

#[derive(Debug, Deserialize)]
pub struct LabResultBody {
  pub user_id:   String,
  pub file_name: String,
  #[serde(default)]
  pub file_data: Option<String>,
  pub summary:   String,
}

/// `POST /lab-results`
pub async fn create_lab_result<S: EventStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<LabResultBody>,
) -> Result<(StatusCode, Json<Stamped<LabResult>>), ApiError> {
  let user = user_id(body.user_id)?;
  let mut record = LabResult { file_name: body.file_name, file: None, summary: body.summary };
  record.validate()?;

  if let Some(data) = body.file_data.as_deref() {
    let file = state
      .attachments
      .save(&user, data, Some(&record.file_name), LAB_DOCUMENT)
      .await?;
    record.file = Some(file);
  }

  append(&state, user.to_string(), record).await
}

#[derive(Debug, Deserialize)]
pub struct VoiceNoteBody {
  pub user_id:    String,
  #[serde(default)]
  pub audio_data: Option<String>,
  #[serde(default)]
  pub transcript: Option<String>,
  pub summary:    String,
}

/// `POST /voice-notes`
pub async fn create_voice_note<S: EventStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<VoiceNoteBody>,
) -> Result<(StatusCode, Json<Stamped<VoiceNote>>), ApiError> {
  let user = user_id(body.user_id)?;
  let mut record = VoiceNote { file: None, transcript: body.transcript, summary: body.summary };
  record.validate()?;

  if let Some(data) = body.audio_data.as_deref() {
    let file = state.attachments.save(&user, data, None, VOICE_RECORDING).await?;
    record.file = Some(file);
  }

  append(&state, user.to_string(), record).await
}
