#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use song_scout::api::AppState;
use song_scout::config::{CatalogCredentials, Config};
use song_scout::error::{AppError, Result};
use song_scout::models::{recommendation::ChatRequest, Artist, SearchResponse};
use song_scout::services::{AccessToken, CatalogApi, CatalogService, ChatApi, Recommender};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const TOKEN: &str = "BQD-test-token";
pub const CLIENT_SECRET: &str = "client-secret-value";

/// In-memory catalog keyed by query text and artist id.
#[derive(Default)]
pub struct FakeCatalog {
    pub calls: Mutex<Vec<String>>,
    pub reject_credentials: bool,
    pub tracks: HashMap<String, Value>,
    pub genres: HashMap<String, Vec<String>>,
}

impl FakeCatalog {
    pub fn with_blinding_lights() -> Self {
        let mut catalog = Self::default();
        catalog.tracks.insert(
            "Blinding Lights".to_string(),
            json!({
                "name": "Blinding Lights",
                "artists": [{ "name": "The Weeknd", "id": "abc" }],
                "album": { "name": "After Hours" }
            }),
        );
        catalog
            .genres
            .insert("abc".to_string(), vec!["synthpop".to_string()]);
        catalog
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn request_token(&self, credentials: &CatalogCredentials) -> Result<AccessToken> {
        self.calls.lock().unwrap().push("token".to_string());
        if self.reject_credentials || credentials.client_secret != CLIENT_SECRET {
            return Err(AppError::Auth("Token endpoint returned status 400".to_string()));
        }
        Ok(AccessToken::new(TOKEN))
    }

    async fn search_tracks(
        &self,
        token: &AccessToken,
        query: &str,
        limit: u32,
    ) -> Result<SearchResponse> {
        assert_eq!(token.secret(), TOKEN);
        assert_eq!(limit, 1);
        self.calls.lock().unwrap().push(format!("search:{}", query));

        let items: Vec<Value> = self.tracks.get(query).cloned().into_iter().collect();
        serde_json::from_value(json!({ "tracks": { "items": items } }))
            .map_err(|e| AppError::Upstream(e.to_string()))
    }

    async fn fetch_artist(&self, token: &AccessToken, artist_id: &str) -> Result<Artist> {
        assert_eq!(token.secret(), TOKEN);
        self.calls.lock().unwrap().push(format!("artist:{}", artist_id));
        Ok(Artist {
            genres: self.genres.get(artist_id).cloned().unwrap_or_default(),
        })
    }
}

/// Chat provider that answers every prompt with the same completion.
pub struct FakeChat {
    pub requests: Mutex<Vec<ChatRequest>>,
    pub reply: Option<Value>,
}

impl FakeChat {
    pub fn answering(text: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: Some(json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }]
            })),
        }
    }

    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: None,
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatApi for FakeChat {
    fn is_configured(&self) -> bool {
        true
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Value> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply
            .clone()
            .ok_or_else(|| AppError::Upstream("AI provider returned status 503".to_string()))
    }
}

pub fn credentials() -> CatalogCredentials {
    CatalogCredentials {
        client_id: "client-id".to_string(),
        client_secret: CLIENT_SECRET.to_string(),
    }
}

pub fn app(catalog: Arc<FakeCatalog>, chat: Arc<FakeChat>) -> Router {
    let config = Config::default();
    let state = Arc::new(AppState {
        catalog: Arc::new(CatalogService::new(catalog, Some(credentials()))),
        recommender: Arc::new(Recommender::new(chat, &config)),
    });
    song_scout::build_app(state, &config)
}

pub async fn send(app: Router, request: Request<Body>) -> (u16, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

pub async fn get(app: Router, uri: &str) -> (u16, String) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: &str) -> (u16, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}
