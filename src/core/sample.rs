use async_trait::async_trait;
use reqwest::Client;

use super::encoder;
use super::error::AvatarError;
use super::session::SourceImage;

/// Where sample photos come from
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Fetch the sample at `url` as a ready-to-use source image
    async fn fetch(&self, url: &str) -> Result<SourceImage, AvatarError>;
}

/// Fetches samples with a plain HTTP GET
pub struct HttpSampleSource {
    client: Client,
}

impl HttpSampleSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SampleSource for HttpSampleSource {
    async fn fetch(&self, url: &str) -> Result<SourceImage, AvatarError> {
        tracing::debug!("Fetching sample image: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("Sample request failed: {}", e);
            AvatarError::SampleFetch
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Sample request returned {}", status);
            return Err(AvatarError::SampleFetch);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        let bytes = response.bytes().await.map_err(|e| {
            tracing::error!("Failed to read sample body: {}", e);
            AvatarError::SampleFetch
        })?;

        Ok(sample_image(url, bytes.to_vec(), content_type))
    }
}

/// Wrap fetched sample bytes, trusting the server's content type when it is an image
pub fn sample_image(url: &str, bytes: Vec<u8>, content_type: Option<String>) -> SourceImage {
    let mime_type = match content_type {
        Some(ct) if encoder::is_image_mime(&ct) => ct,
        _ => encoder::detect_mime_type(None, &bytes),
    };
    SourceImage::new("sample.jpg", bytes, mime_type, url)
}
