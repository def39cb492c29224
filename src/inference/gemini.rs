use axum::async_trait;
use base64::{engine::general_purpose, Engine};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{InferenceClient, InferenceError, ModelResponse};
use crate::config::GeminiConfig;

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(cfg: &GeminiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: cfg.base_url.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

fn build_request(prompt: &str, image: &[u8], mime_type: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text {
                    text: prompt.to_string(),
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data: general_purpose::STANDARD.encode(image),
                    },
                },
            ],
        }],
    }
}

/// Concatenates the text parts of the first candidate.
fn response_text(resp: GenerateContentResponse) -> Result<String, InferenceError> {
    let Some(candidate) = resp.candidates.into_iter().next() else {
        if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(InferenceError::Blocked(reason));
        }
        return Err(InferenceError::EmptyResponse);
    };

    let texts: Vec<String> = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if texts.is_empty() {
        return Err(InferenceError::EmptyResponse);
    }
    Ok(texts.concat())
}

#[async_trait]
impl InferenceClient for GeminiClient {
    #[instrument(skip(self, prompt, image), fields(model = %self.model, bytes = image.len()))]
    async fn generate(
        &self,
        prompt: &str,
        image: Bytes,
        mime_type: &str,
    ) -> Result<ModelResponse, InferenceError> {
        let body = build_request(prompt, &image, mime_type);

        let res = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        debug!(%status, len = text.len(), "gemini response");

        if !status.is_success() {
            return Err(InferenceError::Status { status, body: text });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)?;
        let raw_text = response_text(parsed)?;
        Ok(ModelResponse { raw_text })
    }
}

#[cfg(test)]
mod gemini_tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let req = build_request("describe", b"abc", "image/png");
        let v = serde_json::to_value(&req).unwrap();

        let parts = &v["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "describe");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "YWJj");
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(&GeminiConfig {
            api_key: "k".into(),
            base_url: "https://example.test/v1beta".into(),
            model: "gemini-2.5-flash".into(),
        });
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let resp = parse(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"world"}]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(response_text(resp).unwrap(), "Hello world");
    }

    #[test]
    fn test_response_text_uses_first_candidate() {
        let resp = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"first"}]}},{"content":{"parts":[{"text":"second"}]}}]}"#,
        );
        assert_eq!(response_text(resp).unwrap(), "first");
    }

    #[test]
    fn test_blocked_prompt() {
        let resp = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        match response_text(resp) {
            Err(InferenceError::Blocked(reason)) => assert_eq!(reason, "SAFETY"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_empty_candidate() {
        let resp = parse(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#);
        assert!(matches!(response_text(resp), Err(InferenceError::EmptyResponse)));

        let resp = parse(r#"{}"#);
        assert!(matches!(response_text(resp), Err(InferenceError::EmptyResponse)));
    }

    const STUB_KEY: &str = "stub-key";

    async fn stub_client(status: axum::http::StatusCode, body: &'static str) -> GeminiClient {
        use axum::{
            http::{HeaderMap, StatusCode, Uri},
            response::IntoResponse,
        };

        let app = axum::Router::new().fallback(move |uri: Uri, headers: HeaderMap| async move {
            if uri.path() != "/v1beta/models/gemini-2.5-flash:generateContent" {
                return (StatusCode::NOT_FOUND, "no such route").into_response();
            }
            if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(STUB_KEY) {
                return (StatusCode::UNAUTHORIZED, "missing api key").into_response();
            }
            (status, body).into_response()
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        GeminiClient::new(&GeminiConfig {
            api_key: STUB_KEY.into(),
            base_url: format!("http://{}/v1beta", addr),
            model: "gemini-2.5-flash".into(),
        })
    }

    #[tokio::test]
    async fn test_generate_success() {
        let client = stub_client(
            axum::http::StatusCode::OK,
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"A bowl of pho."}]}}]}"#,
        )
        .await;

        let res = client
            .generate("what is this?", Bytes::from_static(b"img"), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(res.raw_text, "A bowl of pho.");
    }

    #[tokio::test]
    async fn test_generate_non_success_status() {
        let client = stub_client(
            axum::http::StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"message":"quota exceeded"}}"#,
        )
        .await;

        let err = client
            .generate("p", Bytes::from_static(b"img"), "image/png")
            .await
            .unwrap_err();
        match err {
            InferenceError::Status { status, body } => {
                assert_eq!(status, reqwest::StatusCode::TOO_MANY_REQUESTS);
                assert!(body.contains("quota exceeded"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_undecodable_body() {
        let client = stub_client(axum::http::StatusCode::OK, "<html>gateway</html>").await;

        let err = client
            .generate("p", Bytes::from_static(b"img"), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::Decode(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_generate_unreachable_provider() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = GeminiClient::new(&GeminiConfig {
            api_key: STUB_KEY.into(),
            base_url: format!("http://{}/v1beta", addr),
            model: "gemini-2.5-flash".into(),
        });
        let err = client
            .generate("p", Bytes::from_static(b"img"), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::Request(_)), "got {:?}", err);
    }
}
