//! Completion provider abstraction
//!
//! Wraps a single call to the hosted language-model API behind a common
//! interface, so the session layer can be tested against a mock provider.

mod error;
mod gemini;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use gemini::{GeminiModel, GeminiService};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for completion providers
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Submit one user message against the prior provider-side transcript
    /// and request one completion. On success the returned transcript is
    /// the prior one extended by the new user and model turns; on failure
    /// the caller keeps its prior transcript unchanged.
    async fn complete(
        &self,
        user_message: &str,
        prior_turns: &[ProviderTurn],
    ) -> Result<CompletionOutcome, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for completion services
pub struct LoggingService {
    inner: Arc<dyn CompletionService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn CompletionService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl CompletionService for LoggingService {
    async fn complete(
        &self,
        user_message: &str,
        prior_turns: &[ProviderTurn],
    ) -> Result<CompletionOutcome, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(user_message, prior_turns).await;
        let duration = start.elapsed();

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    prior_turns = prior_turns.len(),
                    reply_chars = outcome.reply.len(),
                    "completion request succeeded"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    transient = e.kind.is_transient(),
                    "completion request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
