use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("credentials are neither JSON nor valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded credentials are not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("decoded credentials are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pad a base64 string with `=` up to a multiple of four.
pub fn add_base64_padding(encoded: &str) -> String {
    let padding = (4 - encoded.len() % 4) % 4;
    format!("{encoded}{}", "=".repeat(padding))
}

/// Decode a service-account key given either as raw JSON or as
/// (possibly unpadded) base64 of that JSON.
pub fn decode_credentials(raw: &str) -> Result<Value, CredentialsError> {
    let raw = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        if value.is_object() {
            return Ok(value);
        }
    }

    let bytes = STANDARD.decode(add_base64_padding(raw))?;
    let json = String::from_utf8(bytes)?;
    Ok(serde_json::from_str(&json)?)
}
