/// Generation endpoints backed by Workers AI and Google Text-to-Speech.
///
/// Prompts are translated to English before they reach a model; replies are
/// translated back to Hebrew only where the caller asks for it.
use anyhow::Context;
use axum::Json;
use axum::extract::State;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hyper::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::AppState;
use crate::cloudflare::client::WorkersAi;
use crate::cloudflare::models::GeneratedImage;
use crate::images;
use crate::language::{detect_and_translate, translate_english_to_hebrew};

pub const NO_RESPONSE: &str = "No response from AI";
pub const AI_FAILURE: &str = "Failed to process AI request.";
const TRANSLATION_FAILURE: &str = "An error occurred during translation.";
const DEFAULT_STRENGTH: f64 = 0.5;

type AiError = (StatusCode, Json<Value>);

fn bad_request(message: &str) -> AiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn server_error(message: impl Into<String>) -> AiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message.into() })),
    )
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// A request field that is present and not blank. Missing, `null` and
/// whitespace-only values all count as absent.
fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !is_blank(v))
}

/// Answer a chat message: translate in, ask the model, translate out for Hebrew.
pub(crate) async fn respond_to(
    ai: &dyn WorkersAi,
    text: &str,
    language: Option<&str>,
) -> anyhow::Result<String> {
    let prompt = detect_and_translate(ai, text).await?.translated_text;
    let response = ai.generate_text(&prompt).await?;
    if is_blank(&response) {
        return Ok(NO_RESPONSE.to_string());
    }

    match language {
        Some("he") => translate_english_to_hebrew(ai, &response).await,
        _ => Ok(response),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PromptRequest {
    #[serde(default)]
    prompt: Option<String>,
}

#[tracing::instrument(skip_all)]
pub(crate) async fn generate_image(
    State(state): State<AppState>,
    Json(body): Json<PromptRequest>,
) -> Result<Json<Value>, AiError> {
    let prompt = provided(&body.prompt).ok_or_else(|| bad_request("Prompt is required"))?;

    let result: anyhow::Result<GeneratedImage> = async {
        let prompt = detect_and_translate(state.workers_ai.as_ref(), prompt).await?;
        tracing::info!(language = prompt.language.code(), "generating image");
        state
            .workers_ai
            .generate_image(&prompt.translated_text)
            .await
    }
    .await;

    match result {
        Ok(image) => Ok(Json(json!({
            "imageBase64": images::to_data_url(&image.content_type, &image.bytes),
        }))),
        Err(e) => {
            tracing::error!(error = %e, "error occurred during image generation");
            Err(server_error(e.to_string()))
        }
    }
}

#[tracing::instrument(skip_all)]
pub(crate) async fn generate_text(
    State(state): State<AppState>,
    Json(body): Json<PromptRequest>,
) -> Result<Json<Value>, AiError> {
    let prompt = provided(&body.prompt).ok_or_else(|| bad_request("Prompt is required"))?;

    let generated = respond_to(state.workers_ai.as_ref(), prompt, None)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "error occurred during text generation");
            server_error(e.to_string())
        })?;

    Ok(Json(json!({ "generatedText": generated })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpeechRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    language: Option<String>,
}

#[tracing::instrument(skip_all)]
pub(crate) async fn generate_speech(
    State(state): State<AppState>,
    Json(body): Json<SpeechRequest>,
) -> Result<Json<Value>, AiError> {
    let text = provided(&body.text).ok_or_else(|| bad_request("Text is required"))?;
    let language = provided(&body.language).unwrap_or("en");

    let audio = state
        .speech
        .synthesize(text, language)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "error occurred during speech generation");
            server_error(e.to_string())
        })?;

    Ok(Json(json!({ "audioContent": STANDARD.encode(audio) })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranslateRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    target: Option<String>,
}

#[tracing::instrument(skip_all, fields(target = ?body.target))]
pub(crate) async fn translate(
    State(state): State<AppState>,
    Json(body): Json<TranslateRequest>,
) -> Result<Json<Value>, AiError> {
    let (Some(text), Some(target)) = (provided(&body.text), provided(&body.target)) else {
        return Err(bad_request("Prompt and target language are required."));
    };

    let ai = state.workers_ai.as_ref();
    let result = if target == "he" {
        translate_english_to_hebrew(ai, text).await
    } else {
        detect_and_translate(ai, text)
            .await
            .map(|t| t.translated_text)
    };

    match result {
        Ok(translated) => Ok(Json(json!({ "translatedText": translated }))),
        Err(e) => {
            tracing::error!(error = %e, "error during translation");
            Err(server_error(TRANSLATION_FAILURE))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditRequest {
    #[serde(default)]
    prompt: Option<String>,
    /// Data URL, bare base64, or an http(s) URL to download.
    #[serde(default, alias = "image")]
    image_b64: Option<String>,
    #[serde(default)]
    strength: Option<f64>,
}

async fn fetch_image_base64(client: &reqwest::Client, url: &str) -> anyhow::Result<String> {
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to download image from {url}"))?;

    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("image download returned {status}");
    }

    let bytes = resp.bytes().await.context("failed to read image body")?;
    Ok(STANDARD.encode(bytes))
}

#[tracing::instrument(skip_all)]
pub(crate) async fn edit_image(
    State(state): State<AppState>,
    Json(body): Json<EditRequest>,
) -> Result<Json<Value>, AiError> {
    let (Some(prompt), Some(image)) = (provided(&body.prompt), provided(&body.image_b64)) else {
        return Err(bad_request("Prompt and image are required"));
    };
    // Zero means "unset", like a missing value.
    let strength = body
        .strength
        .filter(|s| *s != 0.0)
        .unwrap_or(DEFAULT_STRENGTH)
        .clamp(0.0, 1.0);

    let result: anyhow::Result<GeneratedImage> = async {
        let image_b64 = if image.starts_with("http") {
            fetch_image_base64(&state.http_client, image).await?
        } else {
            images::base64_payload(image)?.to_string()
        };

        let prompt = detect_and_translate(state.workers_ai.as_ref(), prompt).await?;
        state
            .workers_ai
            .edit_image(&prompt.translated_text, &image_b64, strength)
            .await
    }
    .await;

    match result {
        Ok(image) => Ok(Json(json!({
            "editedImageUrl": images::to_data_url(&image.content_type, &image.bytes),
        }))),
        Err(e) => {
            tracing::error!(error = %e, "error occurred during image editing");
            Err(server_error(e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AiResponseRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    language: Option<String>,
}

#[tracing::instrument(skip_all)]
pub(crate) async fn ai_response(
    State(state): State<AppState>,
    Json(body): Json<AiResponseRequest>,
) -> Result<Json<Value>, AiError> {
    let text = provided(&body.text).ok_or_else(|| bad_request("Text is required"))?;

    let response = respond_to(
        state.workers_ai.as_ref(),
        text,
        body.language.as_deref(),
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "AI response error");
        server_error(AI_FAILURE)
    })?;

    Ok(Json(json!({ "response": response })))
}

