use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::state::AppState;

const SUMMARY_TOP_PATHS: usize = 5;

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

// GET /api/analytics
pub async fn analytics_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.accounting.get_all_stats();
    tracing::info!(records = stats.records_count, "Analytics data requested");

    Json(json!({
        "data": stats,
        "timestamp": now_rfc3339(),
        "message": "API analytics and usage statistics"
    }))
}

// GET /api/analytics/summary
pub async fn summary_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.accounting.get_all_stats();
    let top = |paths: &[crate::stats::PathCount]| {
        paths.iter().take(SUMMARY_TOP_PATHS).cloned().collect::<Vec<_>>()
    };

    Json(json!({
        "data": {
            "currentMetrics": {
                "totalRequests": stats.all.total_requests,
                "avgResponseTime": stats.all.avg_response_time,
                "successRate": stats.all.success_rate,
                "errorRate": stats.all.error_rate,
            },
            "lastHour": {
                "requests": stats.last_hour.total_requests,
                "avgResponseTime": stats.last_hour.avg_response_time,
                "topPaths": top(&stats.last_hour.top_paths),
            },
            "rateLimiting": stats.rate_limit_status,
            "popularEndpoints": top(&stats.all.top_paths),
        },
        "timestamp": now_rfc3339()
    }))
}

// GET /api/analytics/methods
pub async fn methods_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.accounting.get_all_stats();

    Json(json!({
        "data": {
            "byMethod": stats.all.by_method,
            "lastHour": stats.last_hour.by_method,
        },
        "timestamp": now_rfc3339()
    }))
}

// GET /api/analytics/status-codes
pub async fn status_codes_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.accounting.get_all_stats();

    Json(json!({
        "data": {
            "all": stats.all.by_status_code,
            "lastHour": stats.last_hour.by_status_code,
            "successRate": stats.all.success_rate,
            "errorRate": stats.all.error_rate,
        },
        "timestamp": now_rfc3339()
    }))
}

// GET /api/analytics/performance
pub async fn performance_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.accounting.get_all_stats();
    let latency = |s: &crate::stats::RequestStats| {
        json!({
            "avgResponseTime": s.avg_response_time,
            "minResponseTime": s.min_response_time,
            "maxResponseTime": s.max_response_time,
        })
    };

    Json(json!({
        "data": {
            "all": latency(&stats.all),
            "lastHour": latency(&stats.last_hour),
            "lastDay": latency(&stats.last_day),
        },
        "timestamp": now_rfc3339(),
        "unit": "milliseconds"
    }))
}
