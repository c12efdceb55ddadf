//! Iris prediction API server
//!
//! Loads the trained artifact once at startup and serves predictions.
//! Starts even without a model; prediction routes then answer 503.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iris_classifier::{config::Config, create_router, AppState, ModelSlot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iris_classifier=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().context("invalid configuration")?;

    tracing::info!("{} v{} starting...", config.api_title, config.api_version);

    // Load model
    let slot = ModelSlot::load_from(&config.model_path);
    if !slot.is_loaded() {
        tracing::warn!("Serving without a model; prediction routes will return 503");
    }

    // Build router
    let addr = config.bind_addr();
    let app = create_router(AppState::new(slot, config));

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Shutting down API...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
