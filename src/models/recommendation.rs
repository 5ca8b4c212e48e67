use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// How many similar songs the model is asked for.
pub const SUGGESTION_COUNT: usize = 5;

pub const SYSTEM_PROMPT: &str =
    "You are an AI that recommends songs based on similarity to a given song.";

/// Body of `POST /api/openai`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    #[validate(required(message = "Missing song title"), length(min = 1))]
    pub song_title: Option<String>,
    #[validate(required(message = "Missing artist"), length(min = 1))]
    pub artist: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

pub fn user_prompt(song_title: &str, artist: &str) -> String {
    format!(
        "Suggest {} songs similar to '{}' by '{}', but do not include the same song.",
        SUGGESTION_COUNT, song_title, artist
    )
}

/// Pulls `choices[0].message.content` out of a chat-completion body.
pub fn completion_text(completion: &Value) -> Option<&str> {
    completion
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}
