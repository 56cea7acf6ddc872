//! SunriseSpirit - a mood-lifting chat companion
//!
//! Serves a single-page chat where each message gets a short, encouraging
//! reply from a hosted generative model.

mod api;
mod config;
mod llm;
mod prompt;
mod resources;
mod runtime;
mod state_machine;
mod store;

use api::{create_router, AppState, ModelStatus};
use config::AppConfig;
use llm::ModelClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sunrise_spirit=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env()?;

    // Model client. A failure here is not fatal: the page still loads,
    // shows the error, and every message gets the unavailable reply.
    let client = match ModelClient::initialize(&config.model).await {
        Ok(client) => {
            tracing::info!(model = %client.model_id(), "Model client initialized");
            client
        }
        Err(e) => {
            tracing::error!(error = %e, "Model client unavailable");
            ModelClient::unavailable(&config.model, e)
        }
    };

    let model_status = ModelStatus::from_client(&client);
    let state = AppState::new(
        Arc::new(client),
        model_status,
        config.model.request_timeout,
        config.session_grace,
    );

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("SunriseSpirit listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
