//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    model_path: String,
    timestamp: i64,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_loaded = state.model.is_loaded();

    Json(HealthResponse {
        status: if model_loaded { "healthy" } else { "unhealthy" },
        model_loaded,
        model_path: state.config.model_path.display().to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
