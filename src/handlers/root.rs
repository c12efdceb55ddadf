//! Service metadata handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    message: String,
    version: String,
    docs: &'static str,
    health: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RouteDoc {
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DocsResponse {
    title: String,
    version: String,
    routes: Vec<RouteDoc>,
}

pub async fn index(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: state.config.api_title.clone(),
        version: state.config.api_version.clone(),
        docs: "/docs",
        health: "/health",
    })
}

/// Plain route listing
pub async fn docs(State(state): State<AppState>) -> Json<DocsResponse> {
    let routes = vec![
        RouteDoc { method: "GET", path: "/", description: "Service metadata" },
        RouteDoc { method: "GET", path: "/health", description: "Model load status" },
        RouteDoc {
            method: "POST",
            path: "/predict",
            description: "Classify one flower: {sepal_length, sepal_width, petal_length, petal_width}, all >= 0",
        },
        RouteDoc {
            method: "POST",
            path: "/predict/batch",
            description: "Classify an array of flowers; results keep input order",
        },
    ];

    Json(DocsResponse {
        title: state.config.api_title.clone(),
        version: state.config.api_version.clone(),
        routes,
    })
}
