use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::ImageFormat;
use std::path::Path;
use tokio::fs;

use super::error::AvatarError;

/// Base64 payload ready to be sent inline to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub base64: String,
    pub mime_type: String,
}

/// Encode raw image bytes
pub fn encode_bytes(bytes: &[u8], mime_type: impl Into<String>) -> EncodedImage {
    EncodedImage {
        base64: BASE64.encode(bytes),
        mime_type: mime_type.into(),
    }
}

/// Read an image file, returning its bytes and detected MIME type
pub async fn read_file(path: &Path) -> Result<(Vec<u8>, String), AvatarError> {
    let bytes = fs::read(path).await?;
    let mime_type = detect_mime_type(Some(path), &bytes);
    Ok((bytes, mime_type))
}

/// Decode a base64 payload back into bytes
pub fn decode(base64_data: &str) -> Result<Vec<u8>, AvatarError> {
    Ok(BASE64.decode(base64_data.trim())?)
}

/// Work out the MIME type from content, then extension, then default to PNG
pub fn detect_mime_type(path: Option<&Path>, bytes: &[u8]) -> String {
    if let Some(mime) = image::guess_format(bytes).ok().and_then(format_mime_type) {
        return mime.to_string();
    }

    let from_extension = path
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let mime_type = match from_extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        Some("txt") | Some("md") => "text/plain",
        Some("pdf") => "application/pdf",
        _ => "image/png",
    };
    mime_type.to_string()
}

fn format_mime_type(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::Bmp => Some("image/bmp"),
        ImageFormat::Tiff => Some("image/tiff"),
        _ => None,
    }
}

/// Uploads are accepted only for `image/*` content
pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

/// Build a data URI usable directly as a display source
pub fn data_uri(mime_type: &str, base64_data: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64_data)
}
