//! In-memory stand-ins for the external providers, plus request helpers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::RwLock;
use tower::ServiceExt;

use super::{AppState, create_app};
use crate::cloudflare::client::WorkersAi;
use crate::cloudflare::models::GeneratedImage;
use crate::gcloud::speech::SpeechSynthesizer;
use crate::gcloud::storage::{ImageStore, object_name, public_url};
use crate::posts::memory_repository::MemoryPostRepository;

#[derive(Debug, Clone, PartialEq)]
pub struct EditCall {
    pub prompt: String,
    pub image_b64: String,
    pub strength: f64,
}

/// Echoing Workers AI: translations are tagged `[src->dst]`, text is echoed.
#[derive(Default)]
pub struct FakeWorkersAi {
    failure: Mutex<Option<String>>,
    text_reply: Mutex<Option<String>>,
    translations: Mutex<Vec<(String, String)>>,
    prompts: Mutex<Vec<String>>,
    edits: Mutex<Vec<EditCall>>,
}

impl FakeWorkersAi {
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn reply_with(&self, text: &str) {
        *self.text_reply.lock().unwrap() = Some(text.to_string());
    }

    /// `(source, target)` pairs of every translation requested.
    pub fn translations(&self) -> Vec<(String, String)> {
        self.translations.lock().unwrap().clone()
    }

    /// Prompts sent to the text and image models.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<EditCall> {
        self.edits.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WorkersAi for FakeWorkersAi {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.check()?;
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self
            .text_reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| format!("echo: {prompt}")))
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        self.check()?;
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(GeneratedImage {
            content_type: "image/png".to_string(),
            bytes: b"png".to_vec(),
        })
    }

    async fn edit_image(
        &self,
        prompt: &str,
        image_b64: &str,
        strength: f64,
    ) -> Result<GeneratedImage> {
        self.check()?;
        self.edits.lock().unwrap().push(EditCall {
            prompt: prompt.to_string(),
            image_b64: image_b64.to_string(),
            strength,
        });
        Ok(GeneratedImage {
            content_type: "image/jpeg".to_string(),
            bytes: b"jpg".to_vec(),
        })
    }

    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        self.check()?;
        self.translations
            .lock()
            .unwrap()
            .push((source.to_string(), target.to_string()));
        Ok(format!("[{source}->{target}] {text}"))
    }
}

/// Image store that numbers uploads from zero inside `test-bucket`.
#[derive(Default)]
pub struct FakeImageStore {
    failure: Mutex<Option<String>>,
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
}

impl FakeImageStore {
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    /// `(content_type, bytes)` of every upload.
    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for FakeImageStore {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        if let Some(message) = self.failure.lock().unwrap().as_ref() {
            anyhow::bail!("{message}");
        }
        let mut uploads = self.uploads.lock().unwrap();
        let object = object_name(content_type, uploads.len() as i64, "test");
        uploads.push((content_type.to_string(), bytes));
        Ok(public_url("test-bucket", &object))
    }
}

#[derive(Default)]
pub struct FakeSpeech {
    requests: Mutex<Vec<(String, String)>>,
}

impl FakeSpeech {
    /// `(text, language)` of every synthesis request.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        self.requests
            .lock()
            .unwrap()
            .push((text.to_string(), language.to_string()));
        Ok(format!("mp3:{text}").into_bytes())
    }
}

/// An `AppState` wired to fakes, with handles kept for assertions.
pub struct TestApp {
    pub state: AppState,
    pub workers_ai: Arc<FakeWorkersAi>,
    pub image_store: Arc<FakeImageStore>,
    pub speech: Arc<FakeSpeech>,
}

impl TestApp {
    pub fn new() -> Self {
        let workers_ai = Arc::new(FakeWorkersAi::default());
        let image_store = Arc::new(FakeImageStore::default());
        let speech = Arc::new(FakeSpeech::default());
        let state = AppState {
            http_client: Arc::new(
                reqwest::Client::builder()
                    .no_proxy()
                    .build()
                    .unwrap(),
            ),
            post_repo: Arc::new(MemoryPostRepository::new()),
            image_store: image_store.clone(),
            workers_ai: workers_ai.clone(),
            speech: speech.clone(),
            sockets: Arc::new(RwLock::new(HashMap::new())),
            frontend_dir: None,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        };
        Self {
            state,
            workers_ai,
            image_store,
            speech,
        }
    }

    pub fn with_frontend(mut self, dir: &Path) -> Self {
        self.state.frontend_dir = Some(dir.to_path_buf());
        self
    }

    pub fn router(&self) -> Router {
        create_app(self.state.clone())
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

pub async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, bytes) = send(app, request).await;
    (status, String::from_utf8(bytes).unwrap())
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}
