use axum::async_trait;
use bytes::Bytes;

pub mod gemini;

pub use gemini::GeminiClient;

/// Raw text returned by the provider for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    pub raw_text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("request to provider failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("could not decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("prompt was blocked by provider: {0}")]
    Blocked(String),
    #[error("provider response contained no text")]
    EmptyResponse,
}

#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        image: Bytes,
        mime_type: &str,
    ) -> Result<ModelResponse, InferenceError>;
}
