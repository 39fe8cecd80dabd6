// ABOUTME: Centralized error taxonomy mapped to HTTP statuses and JSON bodies
// ABOUTME: Aggregated validation failures return every violated field, not just the first

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Validation(Vec<String>),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Database(sea_orm::DbErr),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msgs) => write!(f, "Validation failed: {}", msgs.join("; ")),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Database(err) => write!(f, "Database error: {}", err),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msgs) => {
                tracing::warn!("Validation failed: {}", msgs.join("; "));
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": msgs }))).into_response()
            }
            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized access: {}", msg);
                error_body(StatusCode::UNAUTHORIZED, &msg)
            }
            AppError::Forbidden(msg) => {
                tracing::warn!("Forbidden: {}", msg);
                error_body(StatusCode::FORBIDDEN, &msg)
            }
            AppError::NotFound(msg) => {
                tracing::info!("Resource not found: {}", msg);
                error_body(StatusCode::NOT_FOUND, &msg)
            }
            AppError::Conflict(msg) => {
                tracing::info!("Conflict: {}", msg);
                error_body(StatusCode::CONFLICT, &msg)
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {}", err);
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed",
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    let body = Json(json!({
        "error": message,
        "status": status.as_u16()
    }));
    (status, body).into_response()
}

// Conversion implementations
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("I/O error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
