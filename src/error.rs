//! Unified application error model and mapping helpers.
//! This module provides a common error enum used by the credential store, the
//! document store and the API handlers, along with the HTTP status mapping and
//! the axum response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::{Display, Formatter};
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Malformed or missing input, reported with the offending field.
    Validation { field: String, message: String },
    /// Missing/invalid credentials or token. One uniform message goes to the
    /// caller; the precise reason is only ever logged.
    Auth { message: String },
    /// A unique constraint was hit (today: duplicate signup email).
    Conflict { message: String },
    NotFound { message: String },
    /// Unexpected failure. The message stays server-side.
    Internal { message: String },
}

impl AppError {
    pub fn message(&self) -> &str {
        match self {
            AppError::Validation { message, .. }
            | AppError::Auth { message }
            | AppError::Conflict { message }
            | AppError::NotFound { message }
            | AppError::Internal { message } => message.as_str(),
        }
    }

    pub fn validation<F: Into<String>, M: Into<String>>(field: F, msg: M) -> Self {
        AppError::Validation { field: field.into(), message: msg.into() }
    }
    pub fn auth<M: Into<String>>(msg: M) -> Self { AppError::Auth { message: msg.into() } }
    pub fn conflict<M: Into<String>>(msg: M) -> Self { AppError::Conflict { message: msg.into() } }
    pub fn not_found<M: Into<String>>(msg: M) -> Self { AppError::NotFound { message: msg.into() } }
    pub fn internal<M: Into<String>>(msg: M) -> Self { AppError::Internal { message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Validation { .. } => 400,
            AppError::Auth { .. } => 401,
            AppError::Conflict { .. } => 409,
            AppError::NotFound { .. } => 404,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation { field, message } => write!(f, "{}: {}", field, message),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { message: err.to_string() }
    }
}

/// Error bodies use a `message` key for auth failures and an `error` key for
/// everything else; clients match on those two shapes. Internal detail is
/// logged and replaced by an opaque body.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = match &self {
            AppError::Internal { message } => {
                error!("internal error: {}", message);
                json!({"error": "internal error"})
            }
            AppError::Auth { message } => json!({"message": message}),
            AppError::Validation { field, message } => json!({"error": message, "field": field}),
            other => json!({"error": other.message()}),
        };
        (status, Json(body)).into_response()
    }
}
