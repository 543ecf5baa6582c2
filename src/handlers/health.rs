use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use std::sync::Arc;

use crate::state::AppState;

// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Health check requested");
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment,
        "checks": {
            "database": "healthy",
            "external_services": "healthy"
        }
    }))
}

// GET /health/live
pub async fn live_handler() -> impl IntoResponse {
    Json(json!({
        "status": "alive",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// GET /health/ready - nothing external to wait on yet
pub async fn ready_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ready",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
