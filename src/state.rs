use crate::config::AppConfig;
use crate::inference::{GeminiClient, InferenceClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub inference: Arc<dyn InferenceClient>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let inference = Arc::new(GeminiClient::new(&config.gemini)) as Arc<dyn InferenceClient>;

        Ok(Self::from_parts(config, inference))
    }

    pub fn from_parts(config: Arc<AppConfig>, inference: Arc<dyn InferenceClient>) -> Self {
        Self { config, inference }
    }

    #[cfg(test)]
    pub fn fake(inference: Arc<dyn InferenceClient>) -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            max_upload_bytes: None,
            gemini: crate::config::GeminiConfig {
                api_key: "test".into(),
                base_url: "http://fake.local".into(),
                model: crate::config::GEMINI_MODEL.into(),
            },
        });

        Self::from_parts(config, inference)
    }
}
