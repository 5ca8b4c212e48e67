use crate::api::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
    catalog: bool,
    ai: bool,
}

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// Reports which upstreams have credentials configured, never the values.
async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        catalog: state.catalog.is_configured(),
        ai: state.recommender.is_configured(),
    })
}
