use crate::config::{CatalogCredentials, Config};
use crate::error::{AppError, Result};
use crate::models::{Artist, SearchResponse, Track, UNKNOWN_GENRE};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;

/// Short-lived catalog bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Raw catalog endpoints. `HttpCatalogApi` talks to the real service; tests
/// swap in a fake.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn request_token(&self, credentials: &CatalogCredentials) -> Result<AccessToken>;

    async fn search_tracks(
        &self,
        token: &AccessToken,
        query: &str,
        limit: u32,
    ) -> Result<SearchResponse>;

    async fn fetch_artist(&self, token: &AccessToken, artist_id: &str) -> Result<Artist>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpCatalogApi {
    accounts_url: Url,
    api_url: Url,
    client: Client,
}

impl HttpCatalogApi {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;

        Ok(Self {
            accounts_url: Url::parse(&config.spotify_accounts_url)?,
            api_url: Url::parse(&config.spotify_api_url)?,
            client,
        })
    }

    fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Catalog base URL cannot be a base: {}", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!("Catalog rejected token for {}: {}", what, status);
            return Err(AppError::Unauthorized);
        }
        if !status.is_success() {
            tracing::error!("Catalog {} returned status {}", what, status);
            return Err(AppError::Upstream(format!(
                "Catalog {} failed with status {}",
                what,
                status.as_u16()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Upstream(format!("Unexpected catalog {} response: {}", what, e)))
    }
}

fn transport_error(what: &str, e: reqwest::Error) -> String {
    if e.is_timeout() {
        format!("Catalog {} timed out", what)
    } else {
        format!("Catalog {} request failed: {}", what, e.without_url())
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn request_token(&self, credentials: &CatalogCredentials) -> Result<AccessToken> {
        let url = Self::endpoint(&self.accounts_url, &["api", "token"])?;

        let response = self
            .client
            .post(url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| AppError::Auth(transport_error("token", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Auth(format!(
                "Token endpoint returned status {}",
                status.as_u16()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Unreadable token response: {}", e)))?;

        body.access_token
            .filter(|t| !t.is_empty())
            .map(AccessToken)
            .ok_or_else(|| AppError::Auth("Token response did not contain an access token".to_string()))
    }

    async fn search_tracks(
        &self,
        token: &AccessToken,
        query: &str,
        limit: u32,
    ) -> Result<SearchResponse> {
        let url = Self::endpoint(&self.api_url, &["search"])?;
        let limit = limit.to_string();

        let response = self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| AppError::Upstream(transport_error("search", e)))?;

        Self::read_json(response, "search").await
    }

    async fn fetch_artist(&self, token: &AccessToken, artist_id: &str) -> Result<Artist> {
        let url = Self::endpoint(&self.api_url, &["artists", artist_id])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| AppError::Upstream(transport_error("artist lookup", e)))?;

        Self::read_json(response, "artist lookup").await
    }
}

/// Token provider, search proxy and genre resolver over a `CatalogApi`.
pub struct CatalogService {
    api: Arc<dyn CatalogApi>,
    credentials: Option<CatalogCredentials>,
}

impl CatalogService {
    pub fn new(api: Arc<dyn CatalogApi>, credentials: Option<CatalogCredentials>) -> Self {
        Self { api, credentials }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Fresh token for one logical operation. Tokens are not cached.
    pub async fn obtain_token(&self) -> Result<AccessToken> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            AppError::Auth("Catalog client credentials are not configured".to_string())
        })?;

        self.api.request_token(credentials).await
    }

    /// Top track for a free-text query.
    pub async fn search_track(&self, query: &str) -> Result<Track> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation("Missing query parameter".to_string()));
        }

        let token = self.obtain_token().await?;

        tracing::debug!("Searching catalog for {:?}", query);
        let response = self.api.search_tracks(&token, query, 1).await?;

        let track = response
            .into_first_track()
            .ok_or_else(|| AppError::NotFound("No tracks found".to_string()))?;

        if track.primary_artist().is_none() {
            return Err(AppError::Upstream(
                "Catalog returned a track without artists".to_string(),
            ));
        }

        tracing::info!("Catalog match for {:?}: {:?}", query, track.name);
        Ok(track)
    }

    /// First genre of the artist, or "Unknown". Never fails.
    pub async fn genre_of(&self, artist_id: Option<&str>) -> String {
        let Some(artist_id) = artist_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return UNKNOWN_GENRE.to_string();
        };

        match self.lookup_genre(artist_id).await {
            Ok(Some(genre)) => genre,
            Ok(None) => {
                tracing::debug!("Artist {} has no genres", artist_id);
                UNKNOWN_GENRE.to_string()
            }
            Err(e) => {
                tracing::warn!("Genre lookup for artist {} failed: {}", artist_id, e);
                UNKNOWN_GENRE.to_string()
            }
        }
    }

    async fn lookup_genre(&self, artist_id: &str) -> Result<Option<String>> {
        let token = self.obtain_token().await?;
        let artist = self.api.fetch_artist(&token, artist_id).await?;
        Ok(artist.genres.into_iter().next())
    }
}
