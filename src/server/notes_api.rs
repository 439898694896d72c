//! Notes CRUD endpoints. Every handler runs behind the auth gate and scopes
//! its work to the authenticated principal.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::{AppError, AppResult};
use crate::server::{ApiJson, AppState, ListParams};
use crate::store::{Note, NoteDraft, NotePatch};

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(draft): ApiJson<NoteDraft>,
) -> AppResult<(StatusCode, Json<Note>)> {
    let note = draft.into_note(principal.user_id)?;
    let note = state.store.0.notes.insert(note)?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Note>> {
    Json(state.store.0.notes.list(principal.user_id, &params.into_filter()))
}

pub async fn fetch(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Note>> {
    state
        .store
        .0
        .notes
        .get(principal.user_id, id)
        .map(Json)
        .ok_or_else(|| AppError::not_found("Note not found"))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<NotePatch>,
) -> AppResult<Json<Note>> {
    patch.validate()?;
    state
        .store
        .0
        .notes
        .update_with(principal.user_id, id, |note| patch.apply(note))?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Note not found"))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if state.store.0.notes.remove(principal.user_id, id)? {
        Ok(Json(json!({ "message": "Note deleted" })))
    } else {
        Err(AppError::not_found("Note not found"))
    }
}
