use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use super::encoder::{self, EncodedImage};
use super::error::AvatarError;

/// The photo the user picked, either from disk or from the sample gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Display name (file name or "sample.jpg")
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Display-only reference: `file://` URL or the sample URL
    pub preview: String,
}

impl SourceImage {
    pub fn new(
        name: impl Into<String>,
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        preview: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            bytes,
            mime_type: mime_type.into(),
            preview: preview.into(),
        }
    }

    /// Read a photo from disk
    pub async fn from_file(path: &Path) -> Result<Self, AvatarError> {
        let (bytes, mime_type) = encoder::read_file(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let preview = format!("file://{}", path.display());
        Ok(Self::new(name, bytes, mime_type, preview))
    }

    pub fn encode(&self) -> EncodedImage {
        encoder::encode_bytes(&self.bytes, self.mime_type.clone())
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// A successful generation, kept as a displayable data URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub data_uri: String,
    pub generated_at: DateTime<Utc>,
}

impl GenerationResult {
    /// Wrap a base64 PNG payload returned by the model
    pub fn from_base64(payload: &str) -> Self {
        Self {
            data_uri: encoder::data_uri("image/png", payload),
            generated_at: Utc::now(),
        }
    }

    /// The base64 part of the data URI
    pub fn payload(&self) -> &str {
        self.data_uri
            .split_once(',')
            .map(|(_, data)| data)
            .unwrap_or_default()
    }
}

/// Derived view of the session for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Loading,
    Success,
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::Loading => write!(f, "loading"),
            SessionStatus::Success => write!(f, "success"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Everything the presentation layer needs to draw a session.
///
/// Only `SessionController` mutates this; everyone else gets `&SessionState`
/// or a clone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) source_image: Option<SourceImage>,
    pub(crate) preview: Option<String>,
    pub(crate) result: Option<GenerationResult>,
    pub(crate) is_loading: bool,
    pub(crate) error: Option<String>,
}

impl SessionState {
    pub fn source_image(&self) -> Option<&SourceImage> {
        self.source_image.as_ref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_loading {
            SessionStatus::Loading
        } else if self.error.is_some() {
            SessionStatus::Failed
        } else if self.result.is_some() {
            SessionStatus::Success
        } else {
            SessionStatus::Idle
        }
    }

    /// Generate is only offered with a source image and nothing in flight
    pub fn can_generate(&self) -> bool {
        self.source_image.is_some() && !self.is_loading
    }

    pub fn can_download(&self) -> bool {
        self.result.is_some() && !self.is_loading
    }

    pub(crate) fn clear_outcome(&mut self) {
        self.result = None;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_payload_roundtrips_through_data_uri() {
        let result = GenerationResult::from_base64("iVBORw0KG");
        assert_eq!(result.data_uri, "data:image/png;base64,iVBORw0KG");
        assert_eq!(result.payload(), "iVBORw0KG");
    }

    #[test]
    fn test_status_derivation() {
        let mut state = SessionState::default();
        assert_eq!(state.status(), SessionStatus::Idle);

        state.result = Some(GenerationResult::from_base64("abc"));
        assert_eq!(state.status(), SessionStatus::Success);

        state.error = Some("boom".into());
        assert_eq!(state.status(), SessionStatus::Failed);

        state.clear_outcome();
        state.is_loading = true;
        assert_eq!(state.status(), SessionStatus::Loading);
        assert!(!state.can_download());
    }

    #[tokio::test]
    async fn test_source_from_file_builds_preview_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("me.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let source = SourceImage::from_file(&path).await.unwrap();
        assert_eq!(source.name, "me.jpg");
        assert_eq!(source.mime_type, "image/jpeg");
        assert_eq!(source.preview, format!("file://{}", path.display()));
        assert_eq!(source.size(), 4);
    }
}
