use crate::api::AppState;
use crate::client::page::escape_html;
use crate::client::{Orchestrator, Page};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;
use serde::Deserialize;
use std::sync::Arc;

// Embed the search page and its static files
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Assets;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub q: Option<String>,
}

/// The search page. With `?q=` the full lookup runs server-side and the
/// results are rendered into the page.
pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Response {
    let page = match params.q.as_deref() {
        Some(query) => {
            let orchestrator = Orchestrator::new(state);
            orchestrator.search(query).await;
            orchestrator.snapshot().await
        }
        None => Page::default(),
    };

    let Some(template) = Assets::get("index.html") else {
        tracing::error!("index.html missing from embedded assets");
        return not_found();
    };
    let template = String::from_utf8_lossy(&template.data);
    let html = render_index(&template, params.q.as_deref().unwrap_or_default(), &page);

    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        html,
    )
        .into_response()
}

/// Fills the `{{query}}`, `{{song_info}}` and `{{recommendations}}` slots in a
/// single pass, so inserted text is never scanned for slots itself.
pub fn render_index(template: &str, query: &str, page: &Page) -> String {
    let mut html = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let (before, tail) = rest.split_at(start);
        html.push_str(before);

        let slot = tail.find("}}").map(|end| (&tail[2..end], end + 2));
        match slot {
            Some(("query", len)) => {
                html.push_str(&escape_html(query));
                rest = &tail[len..];
            }
            Some(("song_info", len)) => {
                html.push_str(&page.song_html());
                rest = &tail[len..];
            }
            Some(("recommendations", len)) => {
                html.push_str(&page.recommendations_html());
                rest = &tail[len..];
            }
            _ => {
                html.push_str("{{");
                rest = &tail[2..];
            }
        }
    }

    html.push_str(rest);
    html
}

pub async fn serve_frontend(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match Assets::get(path) {
        Some(content) => serve_asset(path, content.data.into_owned()),
        None => not_found(),
    }
}

fn serve_asset(path: &str, data: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        data,
    )
        .into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}
