use thiserror::Error;

/// Fallback shown when a failure carries no message of its own
pub const GENERIC_FAILURE: &str = "Failed to generate avatar. Please try again.";

#[derive(Error, Debug)]
pub enum AvatarError {
    #[error("API key not configured. Set GEMINI_API_KEY (or API_KEY) or run: toonify config set api.key <your-key>")]
    MissingApiKey,

    /// Transport, auth, quota or parse failure talking to the model.
    /// Details are logged where they happen and never surfaced here.
    #[error("Failed to communicate with the AI model.")]
    RemoteFailure,

    #[error("Failed to load sample image. Please try again.")]
    SampleFetch,

    #[error("Please upload an image first.")]
    NoSourceImage,

    #[error("The model did not return an image. Please try a different photo.")]
    NoImageReturned,

    #[error("Please upload a valid image file.")]
    InvalidImage,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid image data: {0}")]
    Decode(String),
}

impl AvatarError {
    /// Message to store on the session; never empty
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        }
    }
}

impl From<base64::DecodeError> for AvatarError {
    fn from(err: base64::DecodeError) -> Self {
        AvatarError::Decode(err.to_string())
    }
}
