use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::recommendation::{completion_text, user_prompt, SYSTEM_PROMPT};
use crate::models::{ChatMessage, ChatRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Chat-completion provider seam.
#[async_trait]
pub trait ChatApi: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn complete(&self, request: &ChatRequest) -> Result<Value>;
}

pub struct OpenAiChat {
    api_key: Option<String>,
    completions_url: String,
    client: Client,
}

impl OpenAiChat {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;

        Ok(Self {
            api_key: config.openai_api_key.clone(),
            completions_url: format!(
                "{}/chat/completions",
                config.openai_api_url.trim_end_matches('/')
            ),
            client,
        })
    }
}

#[async_trait]
impl ChatApi for OpenAiChat {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Value> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| AppError::Upstream("AI provider API key not configured".to_string()))?;

        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Upstream("AI provider timed out".to_string())
                } else {
                    AppError::Upstream(format!("Failed to call AI provider: {}", e.without_url()))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "AI provider returned status {}",
                status.as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse AI provider response: {}", e)))
    }
}

/// Asks the chat model for songs similar to a given one.
pub struct Recommender {
    chat: Arc<dyn ChatApi>,
    model: String,
    max_tokens: u32,
}

impl Recommender {
    pub fn new(chat: Arc<dyn ChatApi>, config: &Config) -> Self {
        Self {
            chat,
            model: config.openai_model.clone(),
            max_tokens: config.openai_max_tokens,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.chat.is_configured()
    }

    pub fn build_request(&self, song_title: &str, artist: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(user_prompt(song_title, artist)),
            ],
            max_tokens: self.max_tokens,
        }
    }

    /// Relays the provider's raw completion once it is known to carry text.
    pub async fn recommend(&self, song_title: &str, artist: &str) -> Result<Value> {
        let song_title = song_title.trim();
        let artist = artist.trim();
        if song_title.is_empty() || artist.is_empty() {
            return Err(AppError::Validation("Missing song title or artist".to_string()));
        }

        info!("Requesting recommendations for {:?} by {:?}", song_title, artist);

        let request = self.build_request(song_title, artist);
        let completion = self.chat.complete(&request).await?;

        if completion_text(&completion).is_none() {
            return Err(AppError::Upstream(
                "AI provider response has no completion text".to_string(),
            ));
        }

        Ok(completion)
    }
}
