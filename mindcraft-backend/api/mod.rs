pub mod ai;
pub mod middleware;
pub mod posts;
mod routes;
pub mod socket;
#[cfg(test)]
pub(crate) mod test_support;

use axum::Router;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};

use crate::api::socket::SocketEvent;
use crate::cloudflare::client::WorkersAi;
use crate::gcloud::speech::SpeechSynthesizer;
use crate::gcloud::storage::ImageStore;
use crate::posts::repository::PostRepository;

/// Open WebSocket connections keyed by socket id.
pub type SocketRegistry = Arc<RwLock<HashMap<String, mpsc::UnboundedSender<SocketEvent>>>>;

#[derive(Clone)]
pub struct AppState {
    /// Shared client for ad-hoc fetches (e.g. downloading an image to edit).
    pub http_client: Arc<reqwest::Client>,
    pub post_repo: Arc<dyn PostRepository>,
    pub image_store: Arc<dyn ImageStore>,
    pub workers_ai: Arc<dyn WorkersAi>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub sockets: SocketRegistry,
    /// Built frontend to serve as a SPA. `None` outside production.
    pub frontend_dir: Option<PathBuf>,
    pub allowed_origins: Vec<String>,
}

pub fn create_app(state: AppState) -> Router {
    routes::build_router(state)
}
