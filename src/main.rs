//! finbot - finance-domain chat server
//!
//! Holds per-session conversation transcripts and forwards each user turn
//! to the Gemini completion API under a fixed finance-only policy.

use finbot::api::{create_router, AppState};
use finbot::config::{Config, ConfigError};
use finbot::llm::{
    CompletionService, GeminiModel, GeminiService, GenerationSettings, LoggingService,
    SafetySettings,
};
use finbot::system_prompt;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finbot=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing credential is a hard precondition: refuse to serve anything.
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "startup configuration failed");
            eprintln!("finbot: {e}");
            std::process::exit(1);
        }
    };

    let gateway = match build_gateway(&config) {
        Ok(gateway) => gateway,
        Err(e) => {
            tracing::error!(error = %e, "failed to construct completion gateway");
            eprintln!("finbot: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(model = %gateway.model_id(), "completion gateway initialized");

    let state = AppState::new(gateway);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new().gzip(true).br(true);

    let app = create_router(state).layer(cors).layer(compression);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("finbot chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_gateway(
    config: &Config,
) -> Result<Arc<dyn CompletionService>, Box<dyn std::error::Error>> {
    let model = GeminiModel::from_id(&config.model_id)
        .ok_or_else(|| ConfigError::UnknownModel(config.model_id.clone()))?;

    let service = GeminiService::new(
        config.api_key.clone(),
        model,
        system_prompt::policy().to_string(),
        GenerationSettings::default(),
        SafetySettings::default(),
    )?;

    Ok(Arc::new(LoggingService::new(Arc::new(service))))
}

/// Resolve when the server should shut down
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM - shutting down");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT - shutting down");
        }
    }
}
