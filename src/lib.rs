//! Iris Classifier
//!
//! Trains a RandomForest on the Iris dataset, persists it, and serves
//! predictions over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     IRIS CLASSIFIER                        │
//! ├────────────────────────────────────────────────────────────┤
//! │  iris-train                      iris-serve                │
//! │  ┌──────────┐                    ┌──────────────────────┐  │
//! │  │ dataset  │                    │  API (Axum)          │  │
//! │  │ split    │                    │  /predict            │  │
//! │  │ fit      │──▶ model.json ───▶ │  /predict/batch      │  │
//! │  │ evaluate │    metrics.json    │  /health             │  │
//! │  └──────────┘                    └──────────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;
pub mod training;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::{AppError, AppResult};
pub use state::{AppState, ModelSlot};

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root::index))
        .route("/docs", get(handlers::root::docs))
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::single))
        .route("/predict/batch", post(handlers::predict::batch))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
