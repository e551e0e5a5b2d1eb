//! Content-addressed storage for uploaded lab documents and voice recordings.
//!
//! Uploads arrive base64-encoded inside JSON bodies. They are decoded,
//! size-checked, hashed with SHA-256 and written to
//! `<root>/<user>/<sha256>.<ext>`. Identical content for the same user lands
//! on the same path and is written once.

use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use medala_core::{Error, keys::UserId, record::FileRef};
use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// Upload limit when none is configured.
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Attachments {
  root:      PathBuf,
  max_bytes: usize,
}

/// What to assume about an upload whose file name says nothing useful.
#[derive(Debug, Clone, Copy)]
pub struct Fallback {
  pub extension:  &'static str,
  pub media_type: &'static str,
}

pub const LAB_DOCUMENT: Fallback =
  Fallback { extension: "pdf", media_type: "application/pdf" };

pub const VOICE_RECORDING: Fallback =
  Fallback { extension: "webm", media_type: "audio/webm" };

fn media_type_for(ext: &str) -> Option<&'static str> {
  Some(match ext {
    "pdf" => "application/pdf",
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "heic" => "image/heic",
    "txt" => "text/plain",
    "webm" => "audio/webm",
    "wav" => "audio/wav",
    "mp3" => "audio/mpeg",
    "m4a" => "audio/mp4",
    "ogg" => "audio/ogg",
    _ => return None,
  })
}

fn extension_of(file_name: Option<&str>) -> Option<String> {
  let ext = Path::new(file_name?).extension()?.to_str()?.to_ascii_lowercase();
  let ok = !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric());
  ok.then_some(ext)
}

/// Accepts bare base64 as well as `data:<type>;base64,<payload>` URLs.
fn strip_data_url(encoded: &str) -> &str {
  let trimmed = encoded.trim();
  match trimmed.strip_prefix("data:").and_then(|rest| rest.split_once(";base64,")) {
    Some((_, payload)) => payload,
    None => trimmed,
  }
}

fn user_dir(user: &UserId) -> Result<&str, ApiError> {
  let s = user.as_str();
  if s == "." || s == ".." || s.contains(['/', '\\']) {
    return Err(Error::Validation(format!("user id {s:?} cannot own attachments")).into());
  }
  Ok(s)
}

impl Attachments {
  pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
    Self { root: root.into(), max_bytes }
  }

  pub fn root(&self) -> &Path { &self.root }

  pub fn max_bytes(&self) -> usize { self.max_bytes }

  /// Decode, check and persist one upload.
  pub async fn save(
    &self,
    user: &UserId,
    encoded: &str,
    file_name: Option<&str>,
    fallback: Fallback,
  ) -> Result<FileRef, ApiError> {
    let dir = user_dir(user)?;
    let bytes = B64
      .decode(strip_data_url(encoded))
      .map_err(|e| Error::Validation(format!("attachment is not valid base64: {e}")))?;
    if bytes.is_empty() {
      return Err(Error::Validation("attachment is empty".into()).into());
    }
    if bytes.len() > self.max_bytes {
      return Err(
        Error::Validation(format!(
          "attachment is {} bytes; the limit is {}",
          bytes.len(),
          self.max_bytes
        ))
        .into(),
      );
    }

    let hash = hex::encode(Sha256::digest(&bytes));
    let (ext, media_type) = match extension_of(file_name) {
      Some(ext) => {
        let media = media_type_for(&ext).unwrap_or(fallback.media_type);
        (ext, media)
      }
      None => (fallback.extension.to_owned(), fallback.media_type),
    };

    let relative = format!("{dir}/{hash}.{ext}");
    let target = self.root.join(dir).join(format!("{hash}.{ext}"));

    if !tokio::fs::try_exists(&target).await.map_err(ApiError::Attachment)? {
      tokio::fs::create_dir_all(self.root.join(dir))
        .await
        .map_err(ApiError::Attachment)?;
      tokio::fs::write(&target, &bytes).await.map_err(ApiError::Attachment)?;
      tracing::debug!(path = %target.display(), size = bytes.len(), "stored attachment");
    }

    Ok(FileRef {
      path: relative,
      content_hash: hash,
      media_type: media_type.to_owned(),
      size_bytes: bytes.len() as u64,
    })
  }
}
