//! Google Gemini provider implementation

use super::types::{
    CompletionOutcome, GenerationSettings, ProviderRole, ProviderTurn, SafetySettings,
};
use super::{CompletionService, LlmError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiModel {
    Gemini15Flash,
    Gemini15Pro,
}

impl GeminiModel {
    pub fn api_name(self) -> &'static str {
        match self {
            GeminiModel::Gemini15Flash => "gemini-1.5-flash-latest",
            GeminiModel::Gemini15Pro => "gemini-1.5-pro-latest",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "gemini-1.5-flash" | "gemini-1.5-flash-latest" => Some(GeminiModel::Gemini15Flash),
            "gemini-1.5-pro" | "gemini-1.5-pro-latest" => Some(GeminiModel::Gemini15Pro),
            _ => None,
        }
    }
}

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    api_key: String,
    base_url: String,
    model_id: String,
    policy: String,
    generation: GenerationSettings,
    safety: SafetySettings,
}

impl GeminiService {
    /// Construct the provider handle. Failure here is a startup failure:
    /// the caller must refuse to serve rather than degrade per request.
    pub fn new(
        api_key: String,
        model: GeminiModel,
        policy: String,
        generation: GenerationSettings,
        safety: SafetySettings,
    ) -> Result<Self, LlmError> {
        let base_url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            model.api_name()
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url,
            model_id: model.api_name().to_string(),
            policy,
            generation,
            safety,
        })
    }

    fn translate_request(&self, user_message: &str, prior_turns: &[ProviderTurn]) -> GeminiRequest {
        let mut contents: Vec<GeminiContent> = prior_turns
            .iter()
            .map(|turn| GeminiContent {
                role: Some(role_name(turn.role).to_string()),
                parts: turn
                    .parts
                    .iter()
                    .map(|text| GeminiPart { text: text.clone() })
                    .collect(),
            })
            .collect();

        contents.push(GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                text: user_message.to_string(),
            }],
        });

        GeminiRequest {
            contents,
            system_instruction: Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: self.policy.clone(),
                }],
            }),
            generation_config: Some(GeminiGenerationConfig {
                temperature: Some(self.generation.temperature),
                top_p: Some(self.generation.top_p),
                top_k: Some(self.generation.top_k),
                max_output_tokens: Some(self.generation.max_output_tokens as i32),
            }),
            safety_settings: safety_entries(&self.safety),
        }
    }

    /// Extract the reply and build the transcript for the next turn.
    /// The provider, not the caller, owns turn-formatting consistency:
    /// the model turn is rebuilt from the candidate content as returned.
    fn normalize_response(
        resp: GeminiResponse,
        user_message: &str,
        prior_turns: &[ProviderTurn],
    ) -> Result<CompletionOutcome, LlmError> {
        if let Some(feedback) = &resp.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(LlmError::blocked(format!(
                    "Prompt blocked by safety policy: {reason}"
                )));
            }
        }

        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::unknown("No candidates in response"))?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(LlmError::blocked("Response blocked by safety policy"));
        }

        let parts: Vec<String> = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .collect();

        if parts.is_empty() {
            return Err(LlmError::unknown("Empty response content"));
        }

        let reply = parts.join("");

        let mut updated_turns = prior_turns.to_vec();
        updated_turns.push(ProviderTurn::user(user_message));
        updated_turns.push(ProviderTurn {
            role: ProviderRole::Model,
            parts,
        });

        Ok(CompletionOutcome {
            reply,
            updated_turns,
        })
    }

    fn classify_http_error(status: reqwest::StatusCode, body: &str) -> LlmError {
        if let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(body) {
            let message = error_resp.error.message;
            return match status.as_u16() {
                400 => LlmError::invalid_request(format!("Invalid request: {message}")),
                401 | 403 => LlmError::auth(format!("Authentication failed: {message}")),
                429 => LlmError::rate_limit(format!("Rate limit exceeded: {message}")),
                500..=599 => LlmError::server_error(format!("Server error: {message}")),
                _ => LlmError::unknown(format!("HTTP {status}: {message}")),
            };
        }
        LlmError::unknown(format!("HTTP {status} error: {body}"))
    }
}

#[async_trait]
impl CompletionService for GeminiService {
    async fn complete(
        &self,
        user_message: &str,
        prior_turns: &[ProviderTurn],
    ) -> Result<CompletionOutcome, LlmError> {
        let gemini_request = self.translate_request(user_message, prior_turns);
        let url = format!("{}?key={}", self.base_url, self.api_key);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_http_error(status, &body));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::unknown(format!("Failed to parse response: {e} - body: {body}")))?;

        Self::normalize_response(gemini_response, user_message, prior_turns)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn role_name(role: ProviderRole) -> &'static str {
    match role {
        ProviderRole::User => "user",
        ProviderRole::Model => "model",
    }
}

fn safety_entries(safety: &SafetySettings) -> Vec<GeminiSafetySetting> {
    [
        ("HARM_CATEGORY_HARASSMENT", safety.harassment),
        ("HARM_CATEGORY_HATE_SPEECH", safety.hate_speech),
        ("HARM_CATEGORY_SEXUALLY_EXPLICIT", safety.sexually_explicit),
        ("HARM_CATEGORY_DANGEROUS_CONTENT", safety.dangerous_content),
    ]
    .into_iter()
    .map(|(category, threshold)| GeminiSafetySetting {
        category: category.to_string(),
        threshold: threshold.api_name().to_string(),
    })
    .collect()
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
    safety_settings: Vec<GeminiSafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: GeminiContent,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
    #[allow(dead_code)]
    code: Option<i32>,
    #[allow(dead_code)]
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::SafetyThreshold;
    use crate::llm::LlmErrorKind;

    fn test_service() -> GeminiService {
        GeminiService::new(
            "test-key".to_string(),
            GeminiModel::Gemini15Flash,
            "You only discuss finance.".to_string(),
            GenerationSettings::default(),
            SafetySettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn translate_request_appends_user_message_after_history() {
        let service = test_service();
        let prior = vec![
            ProviderTurn::user("What is a stock?"),
            ProviderTurn::model("A stock is a share of ownership."),
        ];

        let req = service.translate_request("And a bond?", &prior);

        assert_eq!(req.contents.len(), 3);
        assert_eq!(req.contents[0].role.as_deref(), Some("user"));
        assert_eq!(req.contents[1].role.as_deref(), Some("model"));
        assert_eq!(req.contents[2].role.as_deref(), Some("user"));
        assert_eq!(req.contents[2].parts[0].text, "And a bond?");
    }

    #[test]
    fn translate_request_carries_policy_and_decoding_params() {
        let service = test_service();
        let req = service.translate_request("hello", &[]);

        let system = req.system_instruction.expect("system instruction");
        assert_eq!(system.parts[0].text, "You only discuss finance.");
        assert!(system.role.is_none());

        let config = req.generation_config.expect("generation config");
        let temperature = f64::from(config.temperature.unwrap());
        let top_p = f64::from(config.top_p.unwrap());
        assert!((temperature - 0.7).abs() < 1e-6);
        assert!((top_p - 1.0).abs() < 1e-6);
        assert_eq!(config.top_k, Some(1));
        assert_eq!(config.max_output_tokens, Some(2048));
    }

    #[test]
    fn translate_request_sets_all_four_safety_categories() {
        let service = test_service();
        let req = service.translate_request("hello", &[]);

        let categories: Vec<&str> = req
            .safety_settings
            .iter()
            .map(|s| s.category.as_str())
            .collect();
        assert_eq!(
            categories,
            vec![
                "HARM_CATEGORY_HARASSMENT",
                "HARM_CATEGORY_HATE_SPEECH",
                "HARM_CATEGORY_SEXUALLY_EXPLICIT",
                "HARM_CATEGORY_DANGEROUS_CONTENT",
            ]
        );
        for setting in &req.safety_settings {
            assert_eq!(setting.threshold, "BLOCK_MEDIUM_AND_ABOVE");
        }
    }

    #[test]
    fn safety_thresholds_are_independently_configurable() {
        let safety = SafetySettings {
            dangerous_content: SafetyThreshold::BlockOnlyHigh,
            ..SafetySettings::default()
        };
        let entries = safety_entries(&safety);
        assert_eq!(entries[0].threshold, "BLOCK_MEDIUM_AND_ABOVE");
        assert_eq!(entries[3].threshold, "BLOCK_ONLY_HIGH");
    }

    fn text_response(text: &str, finish_reason: Option<&str>) -> GeminiResponse {
        GeminiResponse {
            candidates: vec![GeminiCandidate {
                content: GeminiContent {
                    role: Some("model".to_string()),
                    parts: vec![GeminiPart {
                        text: text.to_string(),
                    }],
                },
                finish_reason: finish_reason.map(str::to_string),
            }],
            prompt_feedback: None,
        }
    }

    #[test]
    fn normalize_extends_transcript_by_two_turns() {
        let prior = vec![
            ProviderTurn::user("hi"),
            ProviderTurn::model("hello, ask me about finance"),
        ];
        let resp = text_response("Bonds are debt instruments.", Some("STOP"));

        let outcome =
            GeminiService::normalize_response(resp, "What is a bond?", &prior).unwrap();

        assert_eq!(outcome.reply, "Bonds are debt instruments.");
        assert_eq!(outcome.updated_turns.len(), 4);
        assert_eq!(outcome.updated_turns[2], ProviderTurn::user("What is a bond?"));
        assert_eq!(
            outcome.updated_turns[3],
            ProviderTurn::model("Bonds are debt instruments.")
        );
    }

    #[test]
    fn normalize_rejects_empty_candidates() {
        let resp = GeminiResponse {
            candidates: vec![],
            prompt_feedback: None,
        };
        let err = GeminiService::normalize_response(resp, "hi", &[]).unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Unknown);
    }

    #[test]
    fn normalize_maps_safety_finish_to_blocked() {
        let resp = text_response("", Some("SAFETY"));
        let err = GeminiService::normalize_response(resp, "hi", &[]).unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Blocked);
    }

    #[test]
    fn normalize_maps_prompt_block_to_blocked() {
        let resp = GeminiResponse {
            candidates: vec![],
            prompt_feedback: Some(GeminiPromptFeedback {
                block_reason: Some("SAFETY".to_string()),
            }),
        };
        let err = GeminiService::normalize_response(resp, "hi", &[]).unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Blocked);
    }

    #[test]
    fn http_error_classification() {
        let body = r#"{"error":{"message":"bad key","code":403,"status":"PERMISSION_DENIED"}}"#;
        let err =
            GeminiService::classify_http_error(reqwest::StatusCode::FORBIDDEN, body);
        assert_eq!(err.kind, LlmErrorKind::Auth);

        let err = GeminiService::classify_http_error(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"slow down","code":429,"status":"RESOURCE_EXHAUSTED"}}"#,
        );
        assert_eq!(err.kind, LlmErrorKind::RateLimit);

        let err = GeminiService::classify_http_error(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "not json",
        );
        assert_eq!(err.kind, LlmErrorKind::Unknown);
    }

    #[test]
    fn model_id_parsing() {
        assert_eq!(
            GeminiModel::from_id("gemini-1.5-flash"),
            Some(GeminiModel::Gemini15Flash)
        );
        assert_eq!(
            GeminiModel::from_id("gemini-1.5-pro-latest"),
            Some(GeminiModel::Gemini15Pro)
        );
        assert_eq!(GeminiModel::from_id("gpt-4o"), None);
    }
}
