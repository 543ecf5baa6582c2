use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{CreateUser, User};
use crate::state::AppState;

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

// GET /api/users
pub async fn list_users_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut users: Vec<User> = state.users.iter().map(|u| u.value().clone()).collect();
    users.sort_by_key(|u| u.id);

    tracing::info!(count = users.len(), "Users list requested");
    Json(json!({
        "data": users,
        "total": users.len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// GET /api/users/{id}
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id: u64 = id.parse().map_err(|_| user_not_found())?;
    let user = state.users.get(&id).ok_or_else(user_not_found)?;

    tracing::info!(id, "User requested");
    Ok(Json(json!({
        "data": user.value(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

// POST /api/users
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let (name, email) = match (payload.name, payload.email) {
        (Some(name), Some(email)) if !name.is_empty() && !email.is_empty() => (name, email),
        _ => {
            return Err(AppError::BadRequest(
                "Name and email are required".to_string(),
            ));
        }
    };

    let user = User {
        id: state.next_user_id(),
        name,
        email,
        created_at: chrono::Utc::now(),
    };
    state.users.insert(user.id, user.clone());
    tracing::info!(id = user.id, "New user created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": user,
            "message": "User created successfully",
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    ))
}
