use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::analytics::record_middleware;
use crate::error::AppError;
use crate::handlers::*;
use crate::metrics::metrics_middleware;
use crate::rate_limit::rate_limit_middleware;
use crate::state::AppState;

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

/// All routes behind, from the outside in: metrics, tracing, rate limiter, recorder, CORS.
///
/// CORS answers preflights itself, so it sits inside the limiter and recorder
/// to keep those requests counted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route("/users/{id}", get(get_user_handler))
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route("/tasks/stats/summary", get(task_stats_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .route("/analytics", get(analytics_handler))
        .route("/analytics/summary", get(summary_handler))
        .route("/analytics/methods", get(methods_handler))
        .route("/analytics/status-codes", get(status_codes_handler))
        .route("/analytics/performance", get(performance_handler))
        .route("/status", get(status_handler))
        .route("/error", get(error_handler));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/health/live", get(live_handler))
        .route("/health/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .nest("/api", api)
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(from_fn_with_state(state.clone(), record_middleware))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(metrics_middleware))
        .with_state(state)
}
