pub mod handlers;

use axum::Router;
use axum::routing::post;

use crate::api::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dalle/generate-image", post(handlers::generate_image))
        .route("/dalle/generate-text", post(handlers::generate_text))
        .route("/dalle/generate-speech", post(handlers::generate_speech))
        .route("/dalle/translate", post(handlers::translate))
        .route("/dalle/edit", post(handlers::edit_image))
        .route("/dalle/ai-response", post(handlers::ai_response))
}
