//! Common types for completion provider interactions

use serde::{Deserialize, Serialize};

/// Role in the provider-side transcript representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    User,
    Model,
}

/// One turn in the provider-side transcript. The provider reconstructs
/// conversational context from a sequence of these on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTurn {
    pub role: ProviderRole,
    pub parts: Vec<String>,
}

impl ProviderTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ProviderRole::User,
            parts: vec![text.into()],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ProviderRole::Model,
            parts: vec![text.into()],
        }
    }

    /// Concatenated text of all parts
    pub fn text(&self) -> String {
        self.parts.join("")
    }
}

/// Successful completion: the reply plus the transcript the caller should
/// carry into the next turn. `updated_turns` is the prior transcript
/// extended by the new user turn and the new model turn, as normalized
/// from the provider response.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub reply: String,
    pub updated_turns: Vec<ProviderTurn>,
}

/// Decoding parameters, fixed at startup
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: i32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            top_k: 1,
            max_output_tokens: 2048,
        }
    }
}

/// Provider-side content filtering sensitivity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

impl SafetyThreshold {
    pub fn api_name(self) -> &'static str {
        match self {
            SafetyThreshold::BlockNone => "BLOCK_NONE",
            SafetyThreshold::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            SafetyThreshold::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            SafetyThreshold::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
        }
    }
}

/// Per-harm-category safety thresholds, each independently configurable
#[derive(Debug, Clone, Copy)]
pub struct SafetySettings {
    pub harassment: SafetyThreshold,
    pub hate_speech: SafetyThreshold,
    pub sexually_explicit: SafetyThreshold,
    pub dangerous_content: SafetyThreshold,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            harassment: SafetyThreshold::BlockMediumAndAbove,
            hate_speech: SafetyThreshold::BlockMediumAndAbove,
            sexually_explicit: SafetyThreshold::BlockMediumAndAbove,
            dangerous_content: SafetyThreshold::BlockMediumAndAbove,
        }
    }
}
