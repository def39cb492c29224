use anyhow::Context;
use serde::Deserialize;

pub const GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: Option<usize>,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .context("Missing GEMINI_API_KEY environment variable")?;

        let gemini = GeminiConfig {
            api_key,
            base_url: lookup("GEMINI_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            model: GEMINI_MODEL.into(),
        };

        let port = match lookup("APP_PORT") {
            Some(v) => v.parse::<u16>().context("APP_PORT is not a valid port")?,
            None => 8000,
        };

        let max_upload_bytes = lookup("MAX_UPLOAD_BYTES")
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("MAX_UPLOAD_BYTES is not a valid byte count")?;

        Ok(Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            max_upload_bytes,
            gemini,
        })
    }
}
