use axum::{
    body::Body,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "web"]
struct Asset;

/// Serves the embedded dashboard. Unknown paths fall back to index.html so a
/// browser refresh keeps working wherever the page left the URL.
pub async fn serve_asset(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    embedded(path)
        .or_else(|| embedded("index.html"))
        .unwrap_or_else(|| (StatusCode::NOT_FOUND, "404 Not Found").into_response())
}

fn embedded(path: &str) -> Option<Response> {
    let content = Asset::get(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Some(
        (
            [(header::CONTENT_TYPE, mime.as_ref())],
            Body::from(content.data),
        )
            .into_response(),
    )
}
