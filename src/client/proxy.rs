use crate::error::AppError;
use crate::models::{GenreResponse, RecommendRequest, SearchResponse, Track, UNKNOWN_GENRE};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("No song found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Request failed: {0}")]
    Failed(String),
}

impl From<AppError> for ClientError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation(msg) => ClientError::Invalid(msg),
            AppError::NotFound(_) => ClientError::NotFound,
            AppError::Unauthorized => ClientError::Unauthorized,
            other => ClientError::Failed(other.to_string()),
        }
    }
}

/// What the orchestrator needs from the proxy endpoints.
#[async_trait]
pub trait ProxyApi: Send + Sync {
    async fn search(&self, query: &str) -> Result<Track, ClientError>;

    /// Never fails; "Unknown" stands in for anything that goes wrong.
    async fn genre(&self, artist_id: Option<&str>) -> String;

    /// Raw chat-completion JSON.
    async fn recommend(&self, song_title: &str, artist: &str) -> Result<Value, ClientError>;
}

/// `ProxyApi` over HTTP, for clients running outside the server process.
#[derive(Debug, Clone)]
pub struct HttpProxy {
    base_url: Url,
    client: Client,
}

impl HttpProxy {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Failed(format!("Bad proxy URL: {}", e)))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify(status, &body))
    }

    async fn fetch_genre(&self, artist_id: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .get(self.url("api/genre")?)
            .query(&[("artistId", artist_id)])
            .send()
            .await
            .map_err(transport)?;

        let body: GenreResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Failed(e.to_string()))?;

        Ok(body.genre)
    }
}

/// Maps a non-success proxy response onto the failure classes the page
/// distinguishes.
pub fn classify(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("status {}", status.as_u16()));

    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound,
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::BAD_REQUEST => ClientError::Invalid(message),
        _ => ClientError::Failed(message),
    }
}

fn transport(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Failed("request timed out".to_string())
    } else {
        ClientError::Failed(e.to_string())
    }
}

#[async_trait]
impl ProxyApi for HttpProxy {
    async fn search(&self, query: &str) -> Result<Track, ClientError> {
        let response = self
            .client
            .get(self.url("api/spotify")?)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(transport)?;

        let body: SearchResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Failed(format!("Unexpected search response: {}", e)))?;

        body.into_first_track().ok_or(ClientError::NotFound)
    }

    async fn genre(&self, artist_id: Option<&str>) -> String {
        let Some(artist_id) = artist_id else {
            return UNKNOWN_GENRE.to_string();
        };

        match self.fetch_genre(artist_id).await {
            Ok(genre) => genre,
            Err(e) => {
                tracing::warn!("Genre lookup failed: {}", e);
                UNKNOWN_GENRE.to_string()
            }
        }
    }

    async fn recommend(&self, song_title: &str, artist: &str) -> Result<Value, ClientError> {
        let body = RecommendRequest {
            song_title: Some(song_title.to_string()),
            artist: Some(artist.to_string()),
        };

        let response = self
            .client
            .post(self.url("api/openai")?)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Failed(format!("Unexpected recommendation response: {}", e)))
    }
}
