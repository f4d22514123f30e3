use anyhow::{bail, Context, Result};
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub redis_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub port: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv().ok(); // Try loading .env file, ignore if it doesn't exist (e.g. env vars set manually)

        Ok(Config {
            client_id: required("SPOTIFY_CLIENT_ID")?,
            client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            redirect_uri: optional("SPOTIFY_REDIRECT_URI")
                .unwrap_or_else(|| "http://localhost:3000/auth/callback".to_string()),
            redis_url: optional("REDIS_URL")
                .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: optional("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-flash-latest".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            frontend_url: optional("FRONTEND_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "http://localhost:3001".to_string()),
            port: match optional("PORT") {
                Some(port) => port
                    .parse()
                    .with_context(|| format!("PORT must be a port number, got {port:?}"))?,
                None => 3000,
            },
        })
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(key: &str) -> Result<String> {
    match optional(key) {
        Some(value) => Ok(value),
        None => bail!("{key} is missing from .env or environment!"),
    }
}
