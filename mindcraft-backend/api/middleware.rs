use axum::{
    body::Body,
    http::{Request, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{Instrument, Span, field::Empty};

/// Span covering one request, with the fields the access logs group by.
fn request_span(req: &Request<Body>) -> Span {
    let uri: &Uri = req.uri();
    let host = req
        .headers()
        .get("host")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("UNKNOWN");

    let span = tracing::info_span!(
        "request",
        http.method = %req.method(),
        http.uri = Empty,
        http.host = Empty,
        http.query = Empty,
    );
    span.record("http.uri", uri.path());
    span.record("http.host", host);
    if let Some(query) = uri.query() {
        span.record("http.query", query);
    }
    span
}

pub async fn request_span_middleware(req: Request<Body>, next: Next) -> Response {
    let span = request_span(&req);
    next.run(req).instrument(span).await
}

/// Path and query with a single trailing slash removed, or `None` when the
/// path has none (the root path `/` is left alone).
fn without_trailing_slash(uri: &Uri) -> Option<String> {
    let path = uri.path().strip_suffix('/').filter(|p| !p.is_empty())?;
    Some(match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    })
}

pub async fn strip_trailing_slash(req: Request<Body>, next: Next) -> Response {
    match without_trailing_slash(req.uri()) {
        Some(target) => Redirect::permanent(&target).into_response(),
        None => next.run(req).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_span_declares_http_fields() {
        let req = Request::builder()
            .uri("/api/v1/post?page=2")
            .header("host", "mindcraft.local")
            .body(Body::empty())
            .unwrap();

        tracing::subscriber::with_default(tracing_subscriber::registry(), || {
            let span = request_span(&req);
            let fields = span.metadata().unwrap().fields();
            for name in ["http.method", "http.uri", "http.host", "http.query"] {
                assert!(fields.field(name).is_some(), "{name}");
            }
        });
    }

    #[test]
    fn test_without_trailing_slash() {
        let uri: Uri = "/api/v1/post/".parse().unwrap();
        assert_eq!(without_trailing_slash(&uri).as_deref(), Some("/api/v1/post"));

        let uri: Uri = "/api/v1/post/?searchText=fox".parse().unwrap();
        assert_eq!(
            without_trailing_slash(&uri).as_deref(),
            Some("/api/v1/post?searchText=fox")
        );
    }

    #[test]
    fn test_root_and_clean_paths_pass_through() {
        assert!(without_trailing_slash(&"/".parse().unwrap()).is_none());
        assert!(without_trailing_slash(&"/api/v1/post".parse().unwrap()).is_none());
    }
}
