use serde::Deserialize;

pub const TEXT_MODEL: &str = "@cf/meta/llama-3-8b-instruct";
pub const IMAGE_MODEL: &str = "@cf/bytedance/stable-diffusion-xl-lightning";
pub const IMG2IMG_MODEL: &str = "@cf/runwayml/stable-diffusion-v1-5-img2img";
pub const TRANSLATION_MODEL: &str = "@cf/meta/m2m100-1.2b";

/// Envelope Workers AI wraps JSON model output in.
#[derive(Debug, Deserialize)]
pub struct RunResponse<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TextResult {
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TranslationResult {
    #[serde(default)]
    pub translated_text: Option<String>,
}

/// Raw image bytes returned by an image model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}
