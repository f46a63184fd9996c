//! Startup configuration
//!
//! The API key resolves through a layered source: a managed secrets file
//! first, then the process environment. Missing both is a fatal startup
//! condition; the server must refuse to serve rather than start degraded.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable carrying the API key when no secrets file is present
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the secrets file location
pub const SECRETS_PATH_ENV: &str = "FINBOT_SECRETS_PATH";

const DEFAULT_CHAT_PORT: u16 = 8501;
const DEFAULT_SUPERVISOR_PORT: u16 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Gemini API key not found. Set `gemini_api_key` in {secrets_path} \
         or export the GEMINI_API_KEY environment variable."
    )]
    MissingApiKey { secrets_path: String },

    #[error("Failed to parse secrets file {path}: {source}")]
    MalformedSecrets {
        path: String,
        source: toml::de::Error,
    },

    #[error("Unknown model id: {0}")]
    UnknownModel(String),
}

/// Resolved startup configuration for the chat server
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model_id: String,
    pub port: u16,
}

/// Shape of the secrets file (TOML)
#[derive(Debug, Deserialize)]
struct SecretsFile {
    gemini_api_key: Option<String>,
}

impl Config {
    /// Load configuration from the secrets file and environment
    pub fn load() -> Result<Self, ConfigError> {
        let secrets_path = secrets_path();
        let api_key = resolve_api_key(&secrets_path)?;

        let model_id = std::env::var("FINBOT_MODEL")
            .unwrap_or_else(|_| "gemini-1.5-flash-latest".to_string());

        let port = std::env::var("FINBOT_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_CHAT_PORT);

        Ok(Self {
            api_key,
            model_id,
            port,
        })
    }
}

/// Port the supervisor's wrapper page listens on
pub fn supervisor_port() -> u16 {
    std::env::var("FINBOT_SUPERVISOR_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_SUPERVISOR_PORT)
}

/// Port the chat server binds (read by the supervisor without loading secrets)
pub fn chat_port() -> u16 {
    std::env::var("FINBOT_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_CHAT_PORT)
}

fn secrets_path() -> PathBuf {
    if let Ok(path) = std::env::var(SECRETS_PATH_ENV) {
        return PathBuf::from(path);
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".finbot").join("secrets.toml")
}

fn resolve_api_key(secrets_path: &Path) -> Result<String, ConfigError> {
    if let Some(key) = read_secrets_key(secrets_path)? {
        tracing::debug!(path = %secrets_path.display(), "API key loaded from secrets file");
        return Ok(key);
    }

    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.is_empty() {
            tracing::debug!("API key loaded from environment");
            return Ok(key);
        }
    }

    Err(ConfigError::MissingApiKey {
        secrets_path: secrets_path.display().to_string(),
    })
}

/// Read the key from the secrets file. An absent file is not an error
/// (the environment fallback still applies); a malformed file is.
fn read_secrets_key(path: &Path) -> Result<Option<String>, ConfigError> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return Ok(None);
    };

    let parsed: SecretsFile =
        toml::from_str(&raw).map_err(|source| ConfigError::MalformedSecrets {
            path: path.display().to_string(),
            source,
        })?;

    Ok(parsed.gemini_api_key.filter(|k| !k.is_empty()))
}
