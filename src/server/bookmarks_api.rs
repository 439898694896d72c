//! Bookmarks CRUD endpoints.
//!
//! Same shape as the notes handlers, with one twist on create: when the
//! caller does not supply a title, one is resolved from the target page
//! before the record is stored. URL validation happens first so a bad URL
//! never triggers a fetch.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::{AppError, AppResult};
use crate::server::{ApiJson, AppState, ListParams};
use crate::store::{Bookmark, BookmarkDraft, BookmarkPatch};

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(draft): ApiJson<BookmarkDraft>,
) -> AppResult<(StatusCode, Json<Bookmark>)> {
    draft.validate()?;
    let title = match draft.provided_title() {
        Some(own) => own.to_string(),
        None => state.titles.resolve(&draft.url).await.into_title(),
    };
    let bookmark = state.store.0.bookmarks.insert(draft.into_bookmark(principal.user_id, title))?;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Bookmark>> {
    Json(state.store.0.bookmarks.list(principal.user_id, &params.into_filter()))
}

pub async fn fetch(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Bookmark>> {
    state
        .store
        .0
        .bookmarks
        .get(principal.user_id, id)
        .map(Json)
        .ok_or_else(|| AppError::not_found("Bookmark not found"))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<BookmarkPatch>,
) -> AppResult<Json<Bookmark>> {
    patch.validate()?;
    state
        .store
        .0
        .bookmarks
        .update_with(principal.user_id, id, |bookmark| patch.apply(bookmark))?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Bookmark not found"))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if state.store.0.bookmarks.remove(principal.user_id, id)? {
        Ok(Json(json!({ "message": "Bookmark deleted" })))
    } else {
        Err(AppError::not_found("Bookmark not found"))
    }
}
