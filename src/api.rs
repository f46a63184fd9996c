//! HTTP API for the chat server

mod assets;
mod handlers;
mod types;

pub use handlers::create_router;
pub use types::*;

use crate::llm::CompletionService;
use crate::session::SessionStore;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub gateway: Arc<dyn CompletionService>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn CompletionService>) -> Self {
        Self {
            store: Arc::new(SessionStore::new()),
            gateway,
        }
    }
}
