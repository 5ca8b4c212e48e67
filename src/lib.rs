pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod frontend;
pub mod models;
pub mod services;

use crate::api::AppState;
use crate::config::Config;
use crate::services::{CatalogService, HttpCatalogApi, OpenAiChat, Recommender};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Wires the real upstream clients from configuration.
pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let catalog_api = Arc::new(HttpCatalogApi::new(config)?);
    let chat = Arc::new(OpenAiChat::new(config)?);

    Ok(Arc::new(AppState {
        catalog: Arc::new(CatalogService::new(catalog_api, config.catalog_credentials())),
        recommender: Arc::new(Recommender::new(chat, config)),
    }))
}

pub fn build_app(state: Arc<AppState>, config: &Config) -> Router {
    Router::new()
        .nest("/api", api::api_routes())
        .route("/", get(frontend::index))
        .with_state(state)
        // Static assets - catch-all route (must be last)
        .fallback(frontend::serve_frontend)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer(config))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            config
                .cors_origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin {:?}", o);
                        None
                    }
                }),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
