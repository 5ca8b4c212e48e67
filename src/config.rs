use std::env;
use std::time::Duration;

/// Client-credentials pair for the music catalog.
#[derive(Clone)]
pub struct CatalogCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for CatalogCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub openai_api_key: Option<String>,
    /// Base URL of the catalog accounts service (token endpoint lives under `/api/token`)
    pub spotify_accounts_url: String,
    pub spotify_api_url: String,
    pub openai_api_url: String,
    pub openai_model: String,
    pub openai_max_tokens: u32,
    pub upstream_timeout: Duration,
    pub server_host: String,
    pub server_port: u16,
    /// Allowed CORS origins (comma-separated). "*" allows any origin.
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let defaults = Config::default();

        let upstream_timeout = match env::var("UPSTREAM_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                anyhow::anyhow!("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds, got {:?}", raw)
            })?),
            Err(_) => defaults.upstream_timeout,
        };

        Ok(Config {
            spotify_client_id: non_empty_var("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: non_empty_var("SPOTIFY_CLIENT_SECRET"),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            spotify_accounts_url: env::var("SPOTIFY_ACCOUNTS_URL")
                .unwrap_or(defaults.spotify_accounts_url),
            spotify_api_url: env::var("SPOTIFY_API_URL").unwrap_or(defaults.spotify_api_url),
            openai_api_url: env::var("OPENAI_API_URL").unwrap_or(defaults.openai_api_url),
            openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_max_tokens: env::var("OPENAI_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.openai_max_tokens),
            upstream_timeout,
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(defaults.server_port),
            cors_origins,
        })
    }

    /// Both halves of the catalog credentials, or `None` if either is unset.
    pub fn catalog_credentials(&self) -> Option<CatalogCredentials> {
        match (&self.spotify_client_id, &self.spotify_client_secret) {
            (Some(id), Some(secret)) => Some(CatalogCredentials {
                client_id: id.clone(),
                client_secret: secret.clone(),
            }),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spotify_client_id: None,
            spotify_client_secret: None,
            openai_api_key: None,
            spotify_accounts_url: "https://accounts.spotify.com".to_string(),
            spotify_api_url: "https://api.spotify.com/v1".to_string(),
            openai_api_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4".to_string(),
            openai_max_tokens: 100,
            upstream_timeout: Duration::from_secs(10),
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("catalog_configured", &self.catalog_credentials().is_some())
            .field("ai_configured", &self.openai_api_key.is_some())
            .field("spotify_accounts_url", &self.spotify_accounts_url)
            .field("spotify_api_url", &self.spotify_api_url)
            .field("openai_api_url", &self.openai_api_url)
            .field("openai_model", &self.openai_model)
            .field("openai_max_tokens", &self.openai_max_tokens)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
