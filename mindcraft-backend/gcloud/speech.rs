use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const TTS_API: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
const SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Turns text into encoded audio bytes (MP3).
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>>;
}

pub struct GoogleSpeech {
    client: Client,
    account: Arc<CustomServiceAccount>,
}

impl GoogleSpeech {
    pub fn new(client: Client, account: Arc<CustomServiceAccount>) -> Self {
        Self { client, account }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

/// Map the short codes the frontend uses onto BCP-47 voice locales.
pub fn voice_language_code(language: &str) -> &str {
    match language {
        "" | "en" => "en-US",
        "he" => "he-IL",
        other => other,
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleSpeech {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let token = self
            .account
            .token(&[SCOPE])
            .await
            .context("failed to get Google access token")?;

        let payload = json!({
            "input": { "text": text },
            "voice": {
                "languageCode": voice_language_code(language),
                "ssmlGender": "NEUTRAL",
            },
            "audioConfig": { "audioEncoding": "MP3" },
        });

        let resp = self
            .client
            .post(TTS_API)
            .bearer_auth(token.as_str())
            .json(&payload)
            .send()
            .await
            .context("failed to call Text-to-Speech")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Text-to-Speech returned {status}: {body}");
        }

        let body: SynthesizeResponse = resp
            .json()
            .await
            .context("failed to parse Text-to-Speech response")?;
        STANDARD
            .decode(body.audio_content)
            .context("Text-to-Speech returned invalid base64 audio")
    }
}
