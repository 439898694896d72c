//!
//! noter HTTP server
//! -----------------
//! This module defines the Axum-based REST API for noter.
//!
//! Responsibilities:
//! - Account endpoints (signup/login/whoami) backed by the credential store.
//! - Bearer-token gate on every resource route via the `auth` module.
//! - Notes and bookmarks CRUD delegating to the document store.
//! - Router assembly with permissive CORS and per-request tracing.
//! - Startup folder/port inventory logs.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::{require_auth, CredentialStore, TokenService};
use crate::config::Config;
use crate::error::AppError;
use crate::metadata::TitleFetcher;
use crate::store::{ListFilter, SharedStore};

pub mod auth_api;
pub mod bookmarks_api;
pub mod notes_api;

/// Shared server state injected into all handlers.
///
/// Holds the global `SharedStore` handle, the credential store, the token
/// service used by both login and the auth gate, and the bookmark title
/// fetcher.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub credentials: Arc<CredentialStore>,
    pub tokens: TokenService,
    pub titles: TitleFetcher,
}

impl AppState {
    /// Open every backing service described by the configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let store = SharedStore::open(&config.db_folder)?;
        let credentials = Arc::new(CredentialStore::open(&config.db_folder)?);
        let tokens = TokenService::new(&config.token_secret, config.token_ttl);
        let titles = TitleFetcher::new(config.fetch_timeout)?;
        Ok(Self { store, credentials, tokens, titles })
    }
}

/// Json extractor that reports body problems through the unified error shape
/// rather than axum's plain-text rejection. Covers malformed JSON, missing
/// bodies and unknown keys alike.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection_to_error(rejection)),
        }
    }
}

fn json_rejection_to_error(rejection: JsonRejection) -> AppError {
    AppError::validation("body", rejection.body_text())
}

/// Recognized list options on the collection endpoints: free-text `q` plus a
/// comma-separated `tags` list. Empty strings impose no constraint.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub tags: Option<String>,
}

impl ListParams {
    pub fn into_filter(self) -> ListFilter {
        ListFilter {
            q: self.q.filter(|q| !q.is_empty()),
            tags: self
                .tags
                .filter(|t| !t.is_empty())
                .map(|t| t.split(',').map(|s| s.to_string()).collect())
                .unwrap_or_default(),
        }
    }
}

/// Assemble the full route table.
///
/// Signup and login stay public; every other `/api` route sits behind the
/// bearer-token gate. The root path answers health probes.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/signup", post(auth_api::signup))
        .route("/auth/login", post(auth_api::login));

    let protected = Router::new()
        .route("/auth/me", get(auth_api::me))
        .route("/notes", get(notes_api::list).post(notes_api::create))
        .route(
            "/notes/{id}",
            get(notes_api::fetch).put(notes_api::update).delete(notes_api::remove),
        )
        .route("/bookmarks", get(bookmarks_api::list).post(bookmarks_api::create))
        .route(
            "/bookmarks/{id}",
            get(bookmarks_api::fetch).put(bookmarks_api::update).delete(bookmarks_api::remove),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(|| async { "noter ok" }))
        .nest("/api", public.merge(protected))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn log_startup(config: &Config) {
    let cwd = std::env::current_dir().ok();
    let exe = std::env::current_exe().ok();
    info!(
        target: "startup",
        "noter starting. cwd={:?}, exe={:?}, db_folder={:?}, http_port={}",
        cwd, exe, config.db_folder, config.http_port
    );
    let db_exists = std::path::Path::new(&config.db_folder).exists();
    info!(target: "startup", "Path existence: db_folder_exists={}", db_exists);
}

/// Start the noter HTTP server bound to the configured port.
pub async fn run(config: Config) -> anyhow::Result<()> {
    log_startup(&config);
    let state = AppState::new(&config)?;
    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Starting server on {}", addr);
    run_with_listener(listener, state).await
}

/// Serve on an already-bound listener. Split out so tests can bind an
/// ephemeral port first and learn the address before requests fly.
pub async fn run_with_listener(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
