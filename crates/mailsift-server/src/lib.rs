//! Mailsift Server
//!
//! HTTP front end for the email extractor. Exposes `POST /parse-email` and a
//! readiness check, and keeps serving in maintenance mode when the extractor
//! cannot be built at startup.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::ServerConfig;
use handlers::{create_router, AppState};
use mailsift_extractor::{Extractor, ExtractorError, PromptTemplate};
use mailsift_llm::{ChatProvider, LlmError};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Completion provider could not be created
    #[error("Provider error: {0}")]
    Provider(#[from] LlmError),

    /// Extractor could not be created
    #[error("Extractor error: {0}")]
    Extractor(#[from] ExtractorError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` overrides the default `info` filter. Calling this twice is a
/// no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Build the extractor described by `config`
pub fn build_extractor(config: &ServerConfig) -> Result<Extractor<ChatProvider>, ServerError> {
    let provider = ChatProvider::new(config.provider.clone())?;
    let template = PromptTemplate::from_file(&config.template_path).map_err(ExtractorError::from)?;
    let extractor = Extractor::new(provider, template, config.extractor.clone())?;
    Ok(extractor)
}

/// Application state for `config`, falling back to maintenance mode
pub fn build_state(config: &ServerConfig) -> AppState<ChatProvider> {
    match build_extractor(config) {
        Ok(extractor) => {
            info!("Extractor initialized with model {}", config.provider.model);
            AppState::new(extractor)
        }
        Err(e) => {
            error!("Extractor initialization failed, service in maintenance mode: {}", e);
            AppState::maintenance()
        }
    }
}

/// Start the HTTP server
///
/// Initializes logging, builds the extractor and serves until the process
/// is stopped.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    init_tracing();

    info!("Starting Mailsift server");
    info!("Bind address: {}", config.bind_addr());
    info!("Prompt template: {}", config.template_path.display());
    info!(
        "Character budget: {}, max attempts: {}",
        config.extractor.max_chars, config.extractor.max_retries
    );

    let state = build_state(&config);
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
