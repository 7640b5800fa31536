use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::models::{
    GeneratedImage, IMAGE_MODEL, IMG2IMG_MODEL, RunResponse, TEXT_MODEL, TRANSLATION_MODEL,
    TextResult, TranslationResult,
};

const CLOUDFLARE_API: &str = "https://api.cloudflare.com/client/v4/accounts";

#[async_trait]
pub trait WorkersAi: Send + Sync {
    /// Run the instruct model. Returns an empty string when the model gave no answer.
    async fn generate_text(&self, prompt: &str) -> Result<String>;
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage>;
    /// `image_b64` is the bare base64 payload, without a data-URL prefix.
    async fn edit_image(&self, prompt: &str, image_b64: &str, strength: f64)
    -> Result<GeneratedImage>;
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

pub struct HttpWorkersAi {
    client: Client,
    account_id: String,
    token: String,
}

impl HttpWorkersAi {
    pub fn new(client: Client, account_id: String, token: String) -> Self {
        Self {
            client,
            account_id,
            token,
        }
    }

    fn model_url(&self, model: &str) -> String {
        format!("{CLOUDFLARE_API}/{}/ai/run/{model}", self.account_id)
    }

    async fn run(&self, model: &str, input: &Value) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(self.model_url(model))
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await
            .with_context(|| format!("failed to call Workers AI model {model}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Workers AI returned {status} for {model}: {body}");
        }
        Ok(resp)
    }

    async fn run_json<T: DeserializeOwned>(&self, model: &str, input: &Value) -> Result<T> {
        let envelope: RunResponse<T> = self
            .run(model, input)
            .await?
            .json()
            .await
            .with_context(|| format!("failed to parse Workers AI response for {model}"))?;
        unwrap_envelope(envelope)
    }

    async fn run_image(&self, model: &str, input: &Value) -> Result<GeneratedImage> {
        let resp = self.run(model, input).await?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = resp
            .bytes()
            .await
            .with_context(|| format!("failed to read image bytes from {model}"))?;
        image_from_parts(content_type.as_deref(), bytes.to_vec())
    }
}

/// Pull `result` out of a Workers AI envelope, turning API errors into one message.
pub fn unwrap_envelope<T>(envelope: RunResponse<T>) -> Result<T> {
    match envelope.result {
        Some(result) if envelope.success => Ok(result),
        _ => {
            let messages: Vec<String> = envelope
                .errors
                .into_iter()
                .map(|e| match e.code {
                    Some(code) => format!("{code}: {}", e.message),
                    None => e.message,
                })
                .collect();
            if messages.is_empty() {
                anyhow::bail!("Workers AI returned no result");
            }
            anyhow::bail!("Workers AI error: {}", messages.join("; "))
        }
    }
}

/// Accept the body only when the provider labelled it as an image.
pub fn image_from_parts(content_type: Option<&str>, bytes: Vec<u8>) -> Result<GeneratedImage> {
    match content_type {
        Some(ct) if ct.starts_with("image/") => Ok(GeneratedImage {
            content_type: ct.to_string(),
            bytes,
        }),
        _ => anyhow::bail!("Unexpected response format from Cloudflare API"),
    }
}

#[async_trait]
impl WorkersAi for HttpWorkersAi {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let result: TextResult = self.run_json(TEXT_MODEL, &json!({ "prompt": prompt })).await?;
        Ok(result.response.unwrap_or_default())
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        self.run_image(IMAGE_MODEL, &json!({ "prompt": prompt })).await
    }

    async fn edit_image(
        &self,
        prompt: &str,
        image_b64: &str,
        strength: f64,
    ) -> Result<GeneratedImage> {
        let input = json!({
            "prompt": prompt,
            "image_b64": image_b64,
            "strength": strength,
        });
        self.run_image(IMG2IMG_MODEL, &input).await
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let input = json!({
            "text": text,
            "source_lang": source,
            "target_lang": target,
        });
        let result: TranslationResult = self.run_json(TRANSLATION_MODEL, &input).await?;
        result
            .translated_text
            .filter(|t| !t.is_empty())
            .context("Error translating text")
    }
}
