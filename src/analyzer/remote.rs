//! Remote skin analysis through the Gemini `generateContent` vision API.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;
use tracing::{error, info, warn};

use super::backend::AnalysisBackend;
use super::extraction::{parse_analysis_text, ParsedAnalysis};
use super::prompts::build_skin_analysis_prompt;
use super::types::{ConditionScore, ScanResult, ScoreSource, SkinCondition};
use crate::error::AnalysisError;
use crate::user::UserContext;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Backend that sends the photo to a hosted vision model.
pub struct RemoteBackend {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    timeout: Duration,
    user: Option<UserContext>,
}

impl RemoteBackend {
    /// Create a backend with the default endpoint, model and 60s timeout.
    ///
    /// The key is not validated here; an empty key fails on the first
    /// `analyze` call before any request is made.
    pub fn new(api_key: impl Into<String>) -> Result<Self, AnalysisError> {
        Self::with_timeout(api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        Ok(Self {
            client: build_api_client(timeout)?,
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout,
            user: None,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self.model = model.into();
        self
    }

    pub fn with_user_context(mut self, user: UserContext) -> Self {
        self.user = Some(user);
        self
    }

    /// `{endpoint}/{model}:generateContent`; the key goes in the query string.
    pub fn request_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl AnalysisBackend for RemoteBackend {
    async fn analyze(&self, image_bytes: &[u8]) -> Result<ScanResult, AnalysisError> {
        if self.api_key.trim().is_empty() {
            error!("Remote analysis requested without an API key");
            return Err(AnalysisError::MissingApiKey);
        }

        info!(
            "Sending {} byte image to model '{}'",
            image_bytes.len(),
            self.model
        );

        let prompt = build_skin_analysis_prompt(self.user.as_ref());
        let body = build_request_body(&prompt, image_bytes);

        let response = self
            .client
            .post(self.request_url())
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let msg = if e.is_timeout() {
                    format!("Gemini API timeout after {}s", self.timeout.as_secs())
                } else {
                    e.to_string()
                };
                error!("{}", msg);
                AnalysisError::Transport(msg)
            })?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| {
            let msg = format!("Failed to read Gemini API response body: {}", e);
            error!("{}", msg);
            AnalysisError::Transport(msg)
        })?;

        if !status.is_success() {
            let message = api_error_message(status.as_u16(), &body_text);
            warn!("Gemini API error ({}): {}", status, message);
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let resp_json: Value = serde_json::from_str(&body_text).map_err(|e| {
            let msg = format!("Gemini API response is not JSON: {}", e);
            error!("{}", msg);
            AnalysisError::InvalidResponse(msg)
        })?;

        let text = response_text(&resp_json);
        let result = into_scan_result(parse_analysis_text(&text));

        if result.is_fallback() {
            warn!("Model response contained no usable condition scores; using zero-filled scores");
        }
        info!(
            "Remote analysis completed with {} condition scores",
            result.scores.len()
        );

        Ok(result)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Build a reqwest client with the given timeout for vision API calls.
fn build_api_client(timeout: Duration) -> Result<reqwest::Client, AnalysisError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AnalysisError::Transport(format!("Failed to build HTTP client: {}", e)))
}

/// Request payload: the prompt plus the base64 JPEG as inline data.
pub fn build_request_body(prompt: &str, image_bytes: &[u8]) -> Value {
    serde_json::json!({
        "contents": [{
            "parts": [
                {"text": prompt},
                {
                    "inline_data": {
                        "mime_type": "image/jpeg",
                        "data": STANDARD.encode(image_bytes)
                    }
                }
            ]
        }]
    })
}

/// Join every `text` part of the first candidate with newlines.
///
/// Returns an empty string when the response has no candidates or parts.
pub fn response_text(resp_json: &Value) -> String {
    resp_json["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<&str>>()
                .join("\n")
        })
        .unwrap_or_default()
}

/// Prefer the API's own `error.message`, else a generic status message.
fn api_error_message(status: u16, body_text: &str) -> String {
    serde_json::from_str::<Value>(body_text)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| format!("Gemini API error: {}", status))
}

/// Turn the parsed text into a result, zero-filling every condition when
/// the model gave us no scores.
fn into_scan_result(parsed: ParsedAnalysis) -> ScanResult {
    let ParsedAnalysis {
        scores,
        skin_analysis,
        recommended_ingredients,
    } = parsed;

    let (scores, source) = if scores.is_empty() {
        (zero_scores(), ScoreSource::Fallback)
    } else {
        (scores, ScoreSource::Measured)
    };

    let mut result = ScanResult::new(scores)
        .with_analysis(skin_analysis)
        .with_ingredients(recommended_ingredients);
    result.score_source = source;
    result
}

fn zero_scores() -> Vec<ConditionScore> {
    SkinCondition::ALL
        .iter()
        .map(|c| ConditionScore::new(*c, 0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = build_request_body("Analyze this", &[0xFF, 0xD8, 0xFF]);
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "Analyze this");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "/9j/");
    }

    #[test]
    fn test_request_url() {
        let backend = RemoteBackend::new("key")
            .unwrap()
            .with_endpoint("https://example.test/v1beta/models/", "gemini-test");
        assert_eq!(
            backend.request_url(),
            "https://example.test/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let resp = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "Here is"}, {"inline": 1}, {"text": "{\"a\":1}"}]}
            }]
        });
        assert_eq!(response_text(&resp), "Here is\n{\"a\":1}");
    }

    #[test]
    fn test_response_text_missing_candidates() {
        assert_eq!(response_text(&serde_json::json!({})), "");
        assert_eq!(response_text(&serde_json::json!({"candidates": []})), "");
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid."}}"#;
        assert_eq!(api_error_message(400, body), "API key not valid.");
        assert_eq!(api_error_message(502, "<html>bad gateway</html>"), "Gemini API error: 502");
    }

    #[test]
    fn test_zero_fill_when_no_scores() {
        let result = into_scan_result(parse_analysis_text("no json at all"));
        assert_eq!(result.scores.len(), SkinCondition::ALL.len());
        assert!(result.scores.iter().all(|s| s.confidence() == 0.0));
        let conditions: Vec<SkinCondition> = result.scores.iter().map(|s| s.condition).collect();
        assert_eq!(conditions, SkinCondition::ALL.to_vec());
        assert!(result.is_fallback());
        assert!(result.skin_analysis.is_none());
    }

    #[test]
    fn test_mixed_conditions_array_falls_back() {
        let text = r#"{"conditions":[{"condition":"acne","confidence":0.5},"redness"]}"#;
        let result = into_scan_result(parse_analysis_text(text));
        assert!(result.is_fallback());
        assert_eq!(result.scores.len(), SkinCondition::ALL.len());
        assert_eq!(result.primary_confidence(), 0.0);
    }

    #[test]
    fn test_explicit_zero_reading_is_measured() {
        let text = r#"{"conditions":[{"condition":"acne","confidence":0.0}]}"#;
        let result = into_scan_result(parse_analysis_text(text));
        assert_eq!(result.scores.len(), 1);
        assert_eq!(result.score_source, ScoreSource::Measured);
    }

    #[test]
    fn test_parsed_fields_carried_into_result() {
        let text = r#"...blah {"skinAnalysis":"ok","recommendedIngredients":["Niacinamide"],"conditions":[{"condition":"Acne","confidence":1.4}]} trailing"#;
        let result = into_scan_result(parse_analysis_text(text));
        assert_eq!(result.scores.len(), 1);
        assert_eq!(result.scores[0].confidence(), 1.0);
        assert_eq!(result.skin_analysis.as_deref(), Some("ok"));
        assert_eq!(result.recommended_ingredients, vec!["Niacinamide".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_request() {
        // Unroutable endpoint: reaching the network would produce a transport error.
        let backend = RemoteBackend::new("   ")
            .unwrap()
            .with_endpoint("http://127.0.0.1:9", "none");
        let err = backend.analyze(&[1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingApiKey));
        assert_eq!(err.to_string(), "Missing Gemini API key");
    }
}
