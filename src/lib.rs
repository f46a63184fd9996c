//! finbot - finance-domain chat service
//!
//! A conversation session store plus a completion gateway to the Gemini
//! API, served over HTTP with an embedded chat page. A separate supervisor
//! binary launches the chat server as a child process and wraps it in an
//! iframe page.

pub mod api;
pub mod config;
pub mod llm;
pub mod session;
pub mod supervisor;
pub mod system_prompt;
