use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::dto::{AnalysisRequest, AnalysisResult};
use super::extract::extract_nutrition;
use super::prompt::resolve_prompt;
use crate::{error::ApiError, state::AppState};

const DEFAULT_MIME: &str = "image/jpeg";

pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze))
}

/// POST /analyze (multipart)
/// Fields: image (file, required), prompt (text, optional)
#[instrument(skip(state, mp))]
pub async fn analyze(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let mut mp = mp.map_err(|rej| {
        warn!(error = %rej.body_text(), "request is not multipart");
        ApiError::BadRequest(rej.body_text())
    })?;
    let req = read_request(&mut mp).await?;

    if req.image.is_empty() {
        warn!(filename = %req.filename, "empty image upload");
        return Err(ApiError::BadRequest("Empty image file".into()));
    }

    let prompt = resolve_prompt(req.prompt.as_deref());
    let bytes = req.image.len();

    let response = state
        .inference
        .generate(prompt, req.image, &req.mime_type)
        .await
        .map_err(|e| {
            error!(error = %e, filename = %req.filename, "inference failed");
            ApiError::Internal(e.to_string())
        })?;

    let extracted = extract_nutrition(&response.raw_text);
    info!(
        filename = %req.filename,
        content_type = %req.mime_type,
        bytes,
        has_nutrition = extracted.nutrition_data.is_some(),
        "image analyzed"
    );

    Ok(Json(AnalysisResult {
        filename: req.filename,
        content_type: req.mime_type,
        markdown: extracted.markdown,
        nutrition_data: extracted.nutrition_data,
    }))
}

async fn read_request(mp: &mut Multipart) -> Result<AnalysisRequest, ApiError> {
    let mut image = None;
    let mut prompt = None;

    while let Some(field) = mp.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("image") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let mime_type = field
                    .content_type()
                    .filter(|ct| !ct.is_empty())
                    .unwrap_or(DEFAULT_MIME)
                    .to_string();
                let data = field.bytes().await.map_err(bad_multipart)?;
                image = Some((filename, mime_type, data));
            }
            Some("prompt") => {
                prompt = Some(field.text().await.map_err(bad_multipart)?);
            }
            _ => {}
        }
    }

    let Some((filename, mime_type, image)) = image else {
        warn!("multipart request without image field");
        return Err(ApiError::Unprocessable("image field is required".into()));
    };

    Ok(AnalysisRequest {
        filename,
        image,
        mime_type,
        prompt,
    })
}

fn bad_multipart(e: MultipartError) -> ApiError {
    warn!(error = %e, "malformed multipart body");
    ApiError::BadRequest(e.to_string())
}
