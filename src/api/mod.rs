pub mod catalog;
pub mod health;
pub mod recommend;

pub use catalog::catalog_routes;
pub use health::health_routes;
pub use recommend::recommend_routes;

use crate::client::{ClientError, ProxyApi};
use crate::models::Track;
use crate::services::{CatalogService, Recommender};
use async_trait::async_trait;
use axum::Router;
use serde_json::Value;
use std::sync::Arc;

pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub recommender: Arc<Recommender>,
}

/// Every `/api` endpoint, before state is attached.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(catalog_routes())
        .merge(recommend_routes())
        .merge(health_routes())
}

/// Lets the server-rendered page drive the orchestrator without a network
/// round-trip to itself.
#[async_trait]
impl ProxyApi for AppState {
    async fn search(&self, query: &str) -> Result<Track, ClientError> {
        Ok(self.catalog.search_track(query).await?)
    }

    async fn genre(&self, artist_id: Option<&str>) -> String {
        self.catalog.genre_of(artist_id).await
    }

    async fn recommend(&self, song_title: &str, artist: &str) -> Result<Value, ClientError> {
        Ok(self.recommender.recommend(song_title, artist).await?)
    }
}
