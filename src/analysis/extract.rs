use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::dto::NutritionData;

lazy_static! {
    static ref JSON_FENCE_RE: Regex = Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub markdown: String,
    pub nutrition_data: Option<NutritionData>,
}

/// Splits a model reply into narrative markdown and the first fenced JSON block.
///
/// Only the first ```` ```json ```` block is consumed. Its removal does not
/// depend on whether the contents decode. Anything other than a JSON object
/// leaves `nutrition_data` empty.
pub fn extract_nutrition(raw: &str) -> Extracted {
    let caps = JSON_FENCE_RE.captures(raw);
    let Some((block, body)) = caps.as_ref().and_then(|c| Some((c.get(0)?, c.get(1)?))) else {
        return Extracted {
            markdown: raw.trim().to_string(),
            nutrition_data: None,
        };
    };

    let nutrition_data = match serde_json::from_str::<Value>(body.as_str()) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            debug!(kind = json_kind(&other), "fenced json block is not an object");
            None
        }
        Err(e) => {
            debug!(error = %e, "fenced json block did not decode");
            None
        }
    };

    let mut markdown = String::with_capacity(raw.len());
    markdown.push_str(&raw[..block.start()]);
    markdown.push_str(&raw[block.end()..]);

    Extracted {
        markdown: markdown.trim().to_string(),
        nutrition_data,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
