use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

/// Structured nutrition estimate embedded in the model's reply.
///
/// Kept as the decoded JSON object so keys and number formatting survive
/// unchanged. The default prompt asks for `dish_name`, `portion_size_g`,
/// `calories_kcal`, `protein_g`, `carbs_g`, `fats_g` and `ingredients`.
pub type NutritionData = Map<String, Value>;

#[derive(Debug)]
pub struct AnalysisRequest {
    pub filename: String,
    pub image: Bytes,
    pub mime_type: String,
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResult {
    pub filename: String,
    pub content_type: String,
    pub markdown: String,
    pub nutrition_data: Option<NutritionData>,
}
