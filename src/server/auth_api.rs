//! Account endpoints: signup, login, whoami.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{Principal, User};
use crate::error::{AppError, AppResult};
use crate::server::{ApiJson, AppState};

/// Loose shape check only: something@something, no whitespace. Real
/// verification would need a confirmation mail anyway.
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("static pattern"));

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct SignupPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Client-facing account view. The password hash never leaves the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for AccountView {
    fn from(user: User) -> Self {
        Self { id: user.id, name: user.name, email: user.email, created_at: user.created_at }
    }
}

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupPayload>,
) -> AppResult<(StatusCode, Json<AccountView>)> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() {
        return Err(AppError::validation("name", "Name is required"));
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(AppError::validation("email", "Valid email is required"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    let user = state.credentials.register(name, email, &payload.password)?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> AppResult<Json<Value>> {
    let Some(user) = state.credentials.verify_login(&payload.email, &payload.password) else {
        return Err(AppError::auth("Invalid credentials"));
    };
    let token = state.tokens.issue(user.id);
    Ok(Json(json!({ "token": token })))
}

/// Resolve the authenticated principal back to its account record.
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<AccountView>> {
    let user = state
        .credentials
        .find_by_id(principal.user_id)
        .ok_or_else(|| AppError::auth("Not authorized"))?;
    Ok(Json(user.into()))
}
