mod types;

use async_trait::async_trait;

pub use types::*;

use crate::config::Config;
use crate::core::AvatarError;
use crate::http_client::HTTP_CLIENT;

/// Anything that can turn a photo into a cartoon avatar
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns the base64 payload of the first image the model produced,
    /// or `None` when the model answered without one.
    async fn generate(&self, base64_image: &str, mime_type: &str)
        -> Result<Option<String>, AvatarError>;
}

/// Gemini API client
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    model: String,
    instruction: String,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Create a new client from config
    pub fn from_config(config: &Config) -> Result<Self, AvatarError> {
        let api_key = config
            .api_key()
            .ok_or(AvatarError::MissingApiKey)?
            .to_string();

        Ok(Self {
            api_key,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            model: config.api.model.clone(),
            instruction: config.prompt.instruction.clone(),
            http: HTTP_CLIENT.clone(),
        })
    }

    /// Use a specific HTTP client instead of the shared one
    #[cfg(test)]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the API request body: the photo first, then the instruction
    pub fn build_request(&self, base64_image: &str, mime_type: &str) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    ContentPart::inline_data(mime_type, base64_image),
                    ContentPart::text(self.instruction.clone()),
                ],
                role: None,
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string(), "TEXT".to_string()]),
            }),
        }
    }

    async fn send(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        tracing::debug!("Sending generate request for model: {}", self.model);

        let response = self.http.post(&url).json(request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!("Response status: {}", status);
        tracing::debug!("Response body: {}", body);

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| format!("{} ({})", e.error.message, e.error.status))
                .unwrap_or(body);
            anyhow::bail!("Gemini API returned {}: {}", status, message);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(
        &self,
        base64_image: &str,
        mime_type: &str,
    ) -> Result<Option<String>, AvatarError> {
        let request = self.build_request(base64_image, mime_type);

        match self.send(&request).await {
            Ok(response) => Ok(first_inline_image(response)),
            Err(e) => {
                tracing::error!("Error generating cartoon avatar: {:#}", e);
                Err(AvatarError::RemoteFailure)
            }
        }
    }
}

/// Scan the first candidate's parts in order and return the first inline image
pub fn first_inline_image(response: GenerateResponse) -> Option<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        tracing::warn!("Prompt blocked: {}", reason);
    }

    let candidate = response.candidates?.into_iter().next()?;

    if let Some(reason) = &candidate.finish_reason {
        if reason != "STOP" && reason != "MAX_TOKENS" {
            tracing::warn!("Unusual finish reason: {}", reason);
        }
    }

    for part in candidate.content?.parts {
        if let Some(inline) = part.inline_data {
            return Some(inline.data);
        }
        if let Some(text) = part.text {
            tracing::debug!("Response text: {}", text);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> GeminiClient {
        let mut config = Config::default();
        config.api.key = Some("test-key".into());
        config.api.base_url = base_url.into();
        GeminiClient::from_config(&config)
            .unwrap()
            .with_http_client(reqwest::Client::builder().no_proxy().build().unwrap())
    }

    fn parse(json: &str) -> GenerateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let config = Config::default();
        assert!(matches!(
            GeminiClient::from_config(&config),
            Err(AvatarError::MissingApiKey)
        ));
    }

    #[test]
    fn test_request_shape() {
        let client = client("https://example.invalid/v1beta");
        let body = serde_json::to_value(client.build_request("AAAA", "image/jpeg")).unwrap();

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "AAAA");
        assert!(parts[1]["text"].as_str().unwrap().contains("cartoon avatar"));
        assert_eq!(
            body["generationConfig"]["responseModalities"],
            serde_json::json!(["IMAGE", "TEXT"])
        );
    }

    #[test]
    fn test_first_image_wins_over_text_and_later_images() {
        let response = parse(
            r#"{
                "candidates": [{
                    "content": {
                        "parts": [
                            {"text": "Here you go"},
                            {"inlineData": {"mimeType": "image/png", "data": "FIRST"}},
                            {"text": "Enjoy"},
                            {"inlineData": {"mimeType": "image/png", "data": "SECOND"}}
                        ]
                    },
                    "finishReason": "STOP"
                }]
            }"#,
        );
        assert_eq!(first_inline_image(response).as_deref(), Some("FIRST"));
    }

    #[test]
    fn test_image_then_text() {
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KG"}},
                {"text": "A cartoon you"}
            ]}}]}"#,
        );
        assert_eq!(first_inline_image(response).as_deref(), Some("iVBORw0KG"));
    }

    #[test]
    fn test_text_only_response_is_absent() {
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [{"text": "I can't do that"}]}}]}"#,
        );
        assert_eq!(first_inline_image(response), None);
    }

    #[test]
    fn test_empty_responses_are_absent() {
        assert_eq!(first_inline_image(parse("{}")), None);
        assert_eq!(first_inline_image(parse(r#"{"candidates": []}"#)), None);
        assert_eq!(
            first_inline_image(parse(r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#)),
            None
        );
    }

    #[test]
    fn test_snake_case_inline_data_is_accepted() {
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [
                {"inline_data": {"mime_type": "image/png", "data": "SNAKE"}}
            ]}}]}"#,
        );
        assert_eq!(first_inline_image(response).as_deref(), Some("SNAKE"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_collapsed() {
        // Bind then drop so nothing is listening on the port
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(&format!("http://{}/v1beta", addr));
        let result = client.generate("AAAA", "image/png").await;
        assert!(matches!(result, Err(AvatarError::RemoteFailure)));
    }
}
