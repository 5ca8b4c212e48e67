use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::{GenreResponse, SearchResponse};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenreParams {
    #[serde(rename = "artistId")]
    pub artist_id: Option<String>,
}

pub fn catalog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/spotify", get(search))
        .route("/genre", get(genre))
}

/// Top catalog track for `q`, in the provider's search shape.
async fn search(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>> {
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;
    let query = params.q.unwrap_or_default();
    let track = state.catalog.search_track(&query).await?;
    Ok(Json(SearchResponse::single(track)))
}

/// Always 200; an unreadable query string resolves to "Unknown" like any other miss.
async fn genre(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<GenreParams>, QueryRejection>,
) -> Json<GenreResponse> {
    let artist_id = params.ok().and_then(|Query(p)| p.artist_id);
    let genre = state.catalog.genre_of(artist_id.as_deref()).await;
    Json(GenreResponse { genre })
}
