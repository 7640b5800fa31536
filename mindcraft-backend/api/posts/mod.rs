pub mod handlers;

use axum::Router;
use axum::routing::get;

use crate::api::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/post", get(handlers::list_posts).post(handlers::create_post))
}
