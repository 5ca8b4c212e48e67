use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::RecommendRequest;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

pub fn recommend_routes() -> Router<Arc<AppState>> {
    Router::new().route("/openai", post(recommend))
}

async fn recommend(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(req) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    req.validate()
        .map_err(|_| AppError::Validation("Missing song title or artist".to_string()))?;

    let completion = state
        .recommender
        .recommend(
            req.song_title.as_deref().unwrap_or_default(),
            req.artist.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(completion))
}
