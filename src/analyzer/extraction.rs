//! Best-effort extraction of the analysis JSON embedded in model text.
//!
//! The vision model answers with free-form text that usually contains a JSON
//! object somewhere inside it, sometimes wrapped in prose or code fences. We
//! do not parse the text structurally: the slice between the first `{` and
//! the last `}` is parsed as JSON, and anything that does not fit degrades to
//! an empty result rather than an error.

use serde_json::Value;
use tracing::{debug, warn};

use super::types::{ConditionScore, SkinCondition};

/// Fields recovered from the model's text answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedAnalysis {
    pub scores: Vec<ConditionScore>,
    pub skin_analysis: Option<String>,
    pub recommended_ingredients: Vec<String>,
}

/// Parse the analysis object out of `text`.
///
/// Never fails. Missing braces, invalid JSON and non-object payloads all
/// yield `ParsedAnalysis::default()`. Unknown condition names are dropped and
/// confidences are clamped into [0, 1].
pub fn parse_analysis_text(text: &str) -> ParsedAnalysis {
    let json = match extract_json_object(text) {
        Some(json) => json,
        None => return ParsedAnalysis::default(),
    };

    let skin_analysis = json
        .get("skinAnalysis")
        .and_then(Value::as_str)
        .map(|s| s.to_string());

    ParsedAnalysis {
        scores: parse_conditions(&json),
        skin_analysis,
        recommended_ingredients: parse_ingredients(&json),
    }
}

/// Slice from the first `{` to the last `}` and parse it as a JSON object.
fn extract_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        debug!("Closing brace precedes opening brace in model text");
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            warn!("Model text contained unparseable JSON: {}", e);
            None
        }
    }
}

/// Ingredients are only accepted as a whole: one non-string entry
/// discards the list.
fn parse_ingredients(json: &serde_json::Map<String, Value>) -> Vec<String> {
    json.get("recommendedIngredients")
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(|s| s.to_string()))
                .collect::<Option<Vec<String>>>()
        })
        .unwrap_or_default()
}

/// Every entry must be an object, otherwise the whole array is ignored.
/// Within objects, entries with a missing or unknown condition are dropped.
fn parse_conditions(json: &serde_json::Map<String, Value>) -> Vec<ConditionScore> {
    let Some(items) = json
        .get("conditions")
        .and_then(Value::as_array)
        .and_then(|items| items.iter().map(Value::as_object).collect::<Option<Vec<_>>>())
    else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| {
            let name = item.get("condition")?.as_str()?;
            let condition = match SkinCondition::from_name(name) {
                Some(c) => c,
                None => {
                    debug!("Dropping unknown condition '{}'", name);
                    return None;
                }
            };
            let confidence = item
                .get("confidence")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            Some(ConditionScore::new(condition, confidence))
        })
        .collect()
}
