//! Error types shared by the server.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors that reach the client as a JSON error envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    TooManyRequests(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Internal(_) => tracing::error!(status = status.as_u16(), "{}", self),
            _ => tracing::debug!(status = status.as_u16(), "{}", self),
        }

        // 500s never leak their cause
        let message = match self {
            AppError::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };

        let body = json!({
            "error": {
                "message": message,
                "status": status.as_u16(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        });

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Refusal to build the accounting subsystem.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rate limit window must be greater than zero")]
    ZeroWindow,
    #[error("rate limit window is too large")]
    WindowTooLarge,
    #[error("max requests per window must be greater than zero")]
    ZeroLimit,
    #[error("request log capacity must be greater than zero")]
    ZeroCapacity,
}

/// A request record that could not be stored.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("request record has an empty method")]
    EmptyMethod,
    #[error("request record path {0:?} is not absolute")]
    RelativePath(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn internal_error_hides_message() {
        let response = AppError::Internal("db exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["message"], "Internal Server Error");
        assert_eq!(body["error"]["status"], 500);
        assert!(body["error"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn not_found_keeps_message() {
        let response = AppError::NotFound("User not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["message"], "User not found");
        assert_eq!(body["error"]["status"], 404);
    }
}
