//! Request guard for the protected API surface.
//! Installed as a route layer ahead of every protected handler: pulls the
//! bearer token out of the Authorization header, verifies it, and attaches
//! the resolved identity to the request. Every failure collapses to the same
//! 401 body so callers cannot probe whether a token was missing, expired,
//! malformed or forged; the distinction only reaches the debug log.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::server::AppState;

/// Identity resolved from a verified bearer token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
}

const REJECTION: &str = "Not authorized";

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = match header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(t) => t.trim(),
        None => {
            debug!("auth.reject missing or non-bearer authorization header");
            return AppError::auth(REJECTION).into_response();
        }
    };
    match state.tokens.verify(token) {
        Ok(user_id) => {
            request.extensions_mut().insert(Principal { user_id });
            next.run(request).await
        }
        Err(err) => {
            debug!("auth.reject token verification failed: {}", err);
            AppError::auth(REJECTION).into_response()
        }
    }
}
