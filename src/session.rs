//! Conversation session state
//!
//! Each session owns two parallel transcripts: a display transcript used
//! for rendering, and the provider-side transcript carried into each
//! completion call. A turn either commits both (success) or commits only
//! the display side with a fallback reply (failure), leaving the provider
//! transcript at its pre-call value.

use crate::llm::{CompletionOutcome, CompletionService, LlmError, ProviderTurn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Fixed user-safe reply rendered when a completion call fails for any reason
pub const FALLBACK_REPLY: &str =
    "Sorry, I encountered an error trying to respond. Please check the server logs or API key.";

/// Role tag for the display transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One rendered message. Immutable once created; ordering is chronological.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The two transcripts for one interactive session
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionState {
    messages: Vec<ChatMessage>,
    provider_turns: Vec<ProviderTurn>,
}

impl SessionState {
    /// Create an empty session. Calling this twice yields identical state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Display transcript, in chronological order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Provider-side transcript carried into the next completion call
    pub fn provider_turns(&self) -> &[ProviderTurn] {
        &self.provider_turns
    }

    /// Process one user turn end to end: append the user message, call the
    /// gateway with the current provider transcript, and commit or roll
    /// back based on the outcome. Returns the reply text for rendering.
    pub async fn apply_turn(
        &mut self,
        gateway: &dyn CompletionService,
        user_text: &str,
    ) -> String {
        let outcome = gateway.complete(user_text, &self.provider_turns).await;
        self.record_outcome(user_text, outcome)
    }

    /// Commit point for one turn. The display transcript always grows by
    /// exactly two entries; the provider transcript is replaced only on
    /// success.
    fn record_outcome(
        &mut self,
        user_text: &str,
        outcome: Result<CompletionOutcome, LlmError>,
    ) -> String {
        self.messages.push(ChatMessage::user(user_text));

        let reply = match outcome {
            Ok(CompletionOutcome {
                reply,
                updated_turns,
            }) => {
                self.provider_turns = updated_turns;
                reply
            }
            Err(e) => {
                tracing::warn!(kind = ?e.kind, error = %e.message, "turn failed, rendering fallback");
                FALLBACK_REPLY.to_string()
            }
        };

        self.messages.push(ChatMessage::assistant(reply.clone()));
        reply
    }
}

/// Sessions held by one server process, keyed by session id. Each session
/// sits behind its own lock so turns within a session are strictly
/// sequential while independent sessions never contend.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Arc<Mutex<SessionState>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh session and return its id
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions
            .lock()
            .await
            .insert(id, Arc::new(Mutex::new(SessionState::new())));
        tracing::debug!(session = %id, "session created");
        id
    }

    async fn get(&self, id: Uuid) -> Option<Arc<Mutex<SessionState>>> {
        self.sessions.lock().await.get(&id).cloned()
    }

    /// Snapshot of a session's display transcript
    pub async fn messages(&self, id: Uuid) -> Option<Vec<ChatMessage>> {
        let session = self.get(id).await?;
        let state = session.lock().await;
        Some(state.messages().to_vec())
    }

    /// Run one turn against a session. Returns the reply and the updated
    /// display transcript, or `None` for an unknown session id.
    pub async fn apply_turn(
        &self,
        id: Uuid,
        gateway: &dyn CompletionService,
        user_text: &str,
    ) -> Option<(String, Vec<ChatMessage>)> {
        let session = self.get(id).await?;
        // The per-session lock is held across the provider call, which is
        // what makes overlapping turns within one session impossible.
        let mut state = session.lock().await;
        let reply = state.apply_turn(gateway, user_text).await;
        Some((reply, state.messages().to_vec()))
    }

    /// Discard a session's transcripts, re-initializing it in place
    pub async fn reset(&self, id: Uuid) -> bool {
        match self.get(id).await {
            Some(session) => {
                *session.lock().await = SessionState::new();
                true
            }
            None => false,
        }
    }
}
