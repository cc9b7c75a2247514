pub mod config;
pub mod generate;
pub mod sample;

use std::sync::Arc;

use crate::api::GeminiClient;
use crate::config::Config;
use crate::core::{AvatarError, HttpSampleSource, SessionController};
use crate::http_client::HTTP_CLIENT;

/// Wire a session controller to the real Gemini client and sample source.
/// Fails when no API key is configured.
pub fn open_session(config: &Config) -> Result<SessionController, AvatarError> {
    let generator = GeminiClient::from_config(config)?;
    tracing::debug!("Using model: {}", generator.model());

    let samples = HttpSampleSource::new(HTTP_CLIENT.clone());

    Ok(SessionController::new(Arc::new(generator), Arc::new(samples))
        .with_download_filename(config.output.filename.clone()))
}
