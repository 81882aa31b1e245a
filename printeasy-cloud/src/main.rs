//! printeasy-cloud — Print shop marketplace core
//!
//! Long-running service that:
//! - Runs the order lifecycle (new → processing → ready → completed, plus
//!   orthogonal soft-deletion)
//! - Derives shop availability from the weekly schedule and manual override
//! - Pushes order/message/shop events to connected clients over WebSocket
//! - Provides the REST API (JWT authenticated, issuance is external)

mod api;
mod auth;
mod cleanup;
mod config;
mod error;
mod live;
mod services;
mod state;
mod store;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "printeasy_cloud=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting printeasy-cloud (env: {})", config.environment);

    // Initialize application state
    let state = AppState::new(&config).await?;

    let app = api::create_router(state.clone());

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("printeasy-cloud HTTP listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await?;

    Ok(())
}

async fn shutdown_signal(state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!(
        sessions = state.registry.session_count(),
        "Shutdown signal received, dropping live sessions"
    );
    state.registry.clear();
}
