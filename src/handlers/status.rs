use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use std::sync::Arc;

use crate::error::AppError;
use crate::state::AppState;

// GET /
pub async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "message": "SDLC Automation Demo API",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// GET /api/status
pub async fn status_handler() -> impl IntoResponse {
    Json(json!({
        "api": "SDLC Automation Demo API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
        "features": [
            "User management",
            "Task management",
            "API analytics & monitoring",
            "Rate limiting",
            "Health monitoring",
            "Metrics collection",
            "Error handling",
            "Request logging",
            "Search and filtering"
        ],
        "endpoints": {
            "users": "/api/users",
            "tasks": "/api/tasks",
            "analytics": "/api/analytics",
            "health": "/health",
            "metrics": "/metrics"
        },
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// GET /api/error - always fails, for exercising the error path
pub async fn error_handler() -> Result<Json<serde_json::Value>, AppError> {
    tracing::warn!("Error endpoint called - simulating error");
    Err(AppError::Internal(
        "This is a simulated error for testing purposes".to_string(),
    ))
}
