/// Community feed endpoints.
///
/// GET  /api/v1/post   — newest posts, `?page=&limit=&searchText=`
/// POST /api/v1/post   — upload the photo, then store `{name, prompt, photo-url}`
use axum::Json;
use axum::extract::{Query, State};
use hyper::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::AppState;
use crate::images;
use crate::posts::{NewPost, PostQuery};

type PostError = (StatusCode, Json<Value>);

fn failure(status: StatusCode, message: impl Into<String>) -> PostError {
    (
        status,
        Json(json!({ "success": false, "message": message.into() })),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListPostsQuery {
    page: Option<u64>,
    limit: Option<u64>,
    #[serde(rename = "searchText")]
    search_text: Option<String>,
}

pub(crate) async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Value>, PostError> {
    let query = PostQuery::new(query.page, query.limit, query.search_text);

    let page = state.post_repo.list(&query).await.map_err(|e| {
        tracing::error!(error = %e, "failed to list posts");
        failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(json!({
        "success": true,
        "data": page.posts,
        "total": page.total,
        "totalPages": page.total_pages,
        "currentPage": query.page,
    })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatePostRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
    /// Base64 data URL of the generated image.
    #[serde(default)]
    photo: Option<String>,
}

/// Trimmed field value; missing, `null` and blank are all rejected.
fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, PostError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, message))
}

#[tracing::instrument(skip_all, fields(name = ?body.name))]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Value>), PostError> {
    let photo = required(&body.photo, "Photo is required.")?;
    let name = required(&body.name, "Name is required.")?;
    let prompt = required(&body.prompt, "Prompt is required.")?;

    let image = images::parse_data_url(photo).map_err(|e| {
        tracing::warn!(error = %e, "rejected post photo");
        failure(StatusCode::BAD_REQUEST, format!("Invalid photo: {e}"))
    })?;

    let photo_url = state
        .image_store
        .upload(image.bytes, &image.content_type)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "error during image upload");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    let post = state
        .post_repo
        .create(NewPost {
            name: name.to_string(),
            prompt: prompt.to_string(),
            photo: photo_url,
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "error during post creation");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": post })),
    ))
}
