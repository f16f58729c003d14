//! Kaiva Server
//!
//! HTTP front end for lease abstraction: accepts a PDF upload, extracts the
//! lease fields with a language model and serves the result as a
//! two-column spreadsheet.
//!
//! # Endpoints
//!
//! - `POST /upload`: multipart form with a `file` field
//! - `GET /download/:filename`: generated `.xlsx` abstract
//! - `GET /health`: liveness check

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use axum::http::{HeaderValue, Method};
use axum::Router as AxumRouter;
use config::ServerConfig;
use handlers::{create_router, AppState};
use kaiva_document::PdfTextExtractor;
use kaiva_domain::traits::LlmProvider;
use kaiva_domain::FieldSchema;
use kaiva_extractor::{Extractor, ExtractorError};
use kaiva_llm::{LlmError, OpenAiProvider};
use kaiva_store::{ArtifactStore, StoreError, XlsxExporter};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Model client could not be built
    #[error("Model client error: {0}")]
    Llm(#[from] LlmError),

    /// Extraction pipeline could not be built
    #[error("Extractor error: {0}")]
    Extractor(#[from] ExtractorError),

    /// Artifact directory unusable
    #[error("Artifact store error: {0}")]
    Store(#[from] StoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build application state around any model provider
pub fn build_state<L>(provider: L, config: &ServerConfig) -> Result<AppState<L>, ServerError>
where
    L: LlmProvider,
{
    let extractor = Extractor::new(provider, FieldSchema::lease(), config.extractor.clone())?
        .with_model_name(config.model.clone());
    let store = ArtifactStore::open(&config.artifact_dir)?;

    Ok(AppState {
        extractor: Arc::new(extractor),
        documents: PdfTextExtractor::new(),
        exporter: XlsxExporter::new(store),
        max_upload_bytes: config.max_upload_bytes,
    })
}

/// Routes plus CORS and request tracing
pub fn build_app<L>(state: AppState<L>, config: &ServerConfig) -> AxumRouter
where
    L: LlmProvider + 'static,
{
    create_router(state)
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS policy for the configured browser origins
///
/// A `"*"` entry allows any origin; credentials are then not allowed.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Start the HTTP server
///
/// Builds the OpenAI client, extraction pipeline and artifact store from
/// `config`, then serves until the process exits.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;

    info!("Starting Kaiva lease abstraction server");
    info!("OpenAI API key loaded: {}...", config.openai_api_key.prefix());
    info!("Model: {}", config.model);
    info!("Allowed origins: {:?}", config.allowed_origins);

    let provider = OpenAiProvider::with_timeout(
        config.openai_api_key.expose(),
        Duration::from_secs(config.request_timeout_secs),
    )?
    .with_base_url(&config.openai_base_url)
    .with_model(&config.model)
    .with_temperature(config.temperature);

    let state = build_state(provider, &config)?;
    let app = build_app(state, &config);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
