use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, thiserror::Error)]
pub enum ImageDataError {
    #[error("image data is empty")]
    Empty,
    #[error("data URL is not base64-encoded")]
    NotBase64Url,
    #[error("data URL does not carry an image: {0}")]
    NotAnImage(String),
    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Split `data:<mime>;base64,<payload>` into its mime type and payload.
/// A bare payload is assumed to be a JPEG.
fn split_data_url(input: &str) -> Result<(&str, &str), ImageDataError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ImageDataError::Empty);
    }

    let Some(rest) = input.strip_prefix("data:") else {
        return Ok((DEFAULT_CONTENT_TYPE, input));
    };
    let (meta, payload) = rest.split_once(',').ok_or(ImageDataError::NotBase64Url)?;
    let content_type = meta
        .strip_suffix(";base64")
        .ok_or(ImageDataError::NotBase64Url)?;
    if !content_type.starts_with("image/") {
        return Err(ImageDataError::NotAnImage(content_type.to_string()));
    }
    if payload.is_empty() {
        return Err(ImageDataError::Empty);
    }
    Ok((content_type, payload))
}

pub fn parse_data_url(input: &str) -> Result<DecodedImage, ImageDataError> {
    let (content_type, payload) = split_data_url(input)?;
    let bytes = STANDARD.decode(payload)?;
    Ok(DecodedImage {
        content_type: content_type.to_string(),
        bytes,
    })
}

/// The base64 payload of a data URL (or the input itself when it has no prefix).
pub fn base64_payload(input: &str) -> Result<&str, ImageDataError> {
    split_data_url(input).map(|(_, payload)| payload)
}

pub fn to_data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", STANDARD.encode(bytes))
}
