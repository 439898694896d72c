//!
//! noter typed client
//! ------------------
//! Consumer-side layer over the REST API: a bearer-token session holder, a
//! typed HTTP client, and locally cached collection views.
//!
//! - `SessionStore` keeps the current token behind a watch channel so UI
//!   layers can react to login/logout without polling.
//! - `ApiClient` wraps every endpoint with typed requests and responses. The
//!   token is read at call time, so one client follows session changes.
//! - `SyncedNotes` / `SyncedBookmarks` mirror a remote collection and apply
//!   server-confirmed records to the local copy after each call.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::store::{Bookmark, BookmarkDraft, BookmarkPatch, Document, Note, NoteDraft, NotePatch};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL {0:?}")]
    BaseUrl(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success HTTP status with the server's own message.
    #[error("HTTP {status}: {message}")]
    Remote { status: u16, message: String },
}

impl ClientError {
    /// Remote status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Holder for the current bearer token. Cloning shares the same session.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn token(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn set_token(&self, token: String) {
        self.tx.send_replace(Some(token));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Watch session changes: fires on every login and logout.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Account record as the API returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// List options for the collection endpoints.
#[derive(Debug, Default, Clone)]
pub struct ListQuery {
    pub q: Option<String>,
    pub tags: Vec<String>,
}

impl ListQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(q) = &self.q {
            out.push(("q", q.clone()));
        }
        if !self.tags.is_empty() {
            out.push(("tags", self.tags.join(",")));
        }
        out
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Typed access to a running noter server.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(base: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base).map_err(|_| ClientError::BaseUrl(base.to_string()))?;
        Ok(Self { base, client: reqwest::Client::new(), session: SessionStore::new() })
    }

    /// Share an existing session, e.g. one the UI already subscribes to.
    pub fn with_session(base: &str, session: SessionStore) -> Result<Self, ClientError> {
        let base = Url::parse(base).map_err(|_| ClientError::BaseUrl(base.to_string()))?;
        Ok(Self { base, client: reqwest::Client::new(), session })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // ---- accounts ----

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Account, ClientError> {
        let body = serde_json::json!({ "name": name, "email": email, "password": password });
        let req = self.request(Method::POST, "/api/auth/signup")?.json(&body);
        send_json(req).await
    }

    /// Exchange credentials for a token and remember it in the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let req = self.request(Method::POST, "/api/auth/login")?.json(&body);
        let resp: TokenResponse = send_json(req).await?;
        self.session.set_token(resp.token);
        Ok(())
    }

    /// Forget the token. Purely local; the server keeps no session state.
    pub fn logout(&self) {
        self.session.clear();
    }

    pub async fn me(&self) -> Result<Account, ClientError> {
        send_json(self.request(Method::GET, "/api/auth/me")?).await
    }

    // ---- notes ----

    pub async fn notes(&self, query: &ListQuery) -> Result<Vec<Note>, ClientError> {
        let req = self.request(Method::GET, "/api/notes")?.query(&query.params());
        send_json(req).await
    }

    pub async fn create_note(&self, draft: &NoteDraft) -> Result<Note, ClientError> {
        send_json(self.request(Method::POST, "/api/notes")?.json(draft)).await
    }

    pub async fn note(&self, id: Uuid) -> Result<Note, ClientError> {
        send_json(self.request(Method::GET, &format!("/api/notes/{id}"))?).await
    }

    pub async fn update_note(&self, id: Uuid, patch: &NotePatch) -> Result<Note, ClientError> {
        send_json(self.request(Method::PUT, &format!("/api/notes/{id}"))?.json(patch)).await
    }

    pub async fn delete_note(&self, id: Uuid) -> Result<(), ClientError> {
        send_ok(self.request(Method::DELETE, &format!("/api/notes/{id}"))?).await
    }

    // ---- bookmarks ----

    pub async fn bookmarks(&self, query: &ListQuery) -> Result<Vec<Bookmark>, ClientError> {
        let req = self.request(Method::GET, "/api/bookmarks")?.query(&query.params());
        send_json(req).await
    }

    pub async fn create_bookmark(&self, draft: &BookmarkDraft) -> Result<Bookmark, ClientError> {
        send_json(self.request(Method::POST, "/api/bookmarks")?.json(draft)).await
    }

    pub async fn bookmark(&self, id: Uuid) -> Result<Bookmark, ClientError> {
        send_json(self.request(Method::GET, &format!("/api/bookmarks/{id}"))?).await
    }

    pub async fn update_bookmark(&self, id: Uuid, patch: &BookmarkPatch) -> Result<Bookmark, ClientError> {
        send_json(self.request(Method::PUT, &format!("/api/bookmarks/{id}"))?.json(patch)).await
    }

    pub async fn delete_bookmark(&self, id: Uuid) -> Result<(), ClientError> {
        send_ok(self.request(Method::DELETE, &format!("/api/bookmarks/{id}"))?).await
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self
            .base
            .join(path)
            .map_err(|_| ClientError::BaseUrl(format!("{}{}", self.base, path)))?;
        let mut req = self.client.request(method, url);
        // Token is read per call so the same client follows session changes.
        if let Some(token) = self.session.token() {
            req = req.bearer_auth(token);
        }
        Ok(req)
    }
}

async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ClientError> {
    let resp = req.send().await?;
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }
    Ok(resp.json::<T>().await?)
}

async fn send_ok(req: RequestBuilder) -> Result<(), ClientError> {
    let resp = req.send().await?;
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }
    Ok(())
}

/// Pull the server's message out of an error body; both the `error` and the
/// `message` key are in use depending on the endpoint.
async fn error_from_response(resp: reqwest::Response) -> ClientError {
    let status = resp.status().as_u16();
    let message = match resp.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(|m| m.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| body.to_string()),
        Err(_) => String::from("unreadable error body"),
    };
    ClientError::Remote { status, message }
}

fn upsert<T: Document>(items: &mut Vec<T>, record: T) {
    if let Some(slot) = items.iter_mut().find(|existing| existing.id() == record.id()) {
        *slot = record;
    } else {
        items.push(record);
    }
}

/// Locally cached view of the notes collection. Every mutation goes through
/// the API first and the cache is updated from the record the server
/// returned, so the view tracks confirmed state rather than optimistic edits.
#[derive(Clone)]
pub struct SyncedNotes {
    api: ApiClient,
    cache: Arc<watch::Sender<Vec<Note>>>,
}

impl SyncedNotes {
    pub fn new(api: ApiClient) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self { api, cache: Arc::new(tx) }
    }

    pub fn current(&self) -> Vec<Note> {
        self.cache.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Note>> {
        self.cache.subscribe()
    }

    /// Replace the cache with a fresh server listing.
    pub async fn refresh(&self, query: &ListQuery) -> Result<(), ClientError> {
        let items = self.api.notes(query).await?;
        self.cache.send_replace(items);
        Ok(())
    }

    pub async fn create(&self, draft: &NoteDraft) -> Result<Note, ClientError> {
        let note = self.api.create_note(draft).await?;
        self.cache.send_modify(|items| upsert(items, note.clone()));
        Ok(note)
    }

    pub async fn update(&self, id: Uuid, patch: &NotePatch) -> Result<Note, ClientError> {
        let note = self.api.update_note(id, patch).await?;
        self.cache.send_modify(|items| upsert(items, note.clone()));
        Ok(note)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        self.api.delete_note(id).await?;
        self.cache.send_modify(|items| items.retain(|note| note.id != id));
        Ok(())
    }
}

/// Locally cached view of the bookmarks collection; same contract as
/// `SyncedNotes`.
#[derive(Clone)]
pub struct SyncedBookmarks {
    api: ApiClient,
    cache: Arc<watch::Sender<Vec<Bookmark>>>,
}

impl SyncedBookmarks {
    pub fn new(api: ApiClient) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self { api, cache: Arc::new(tx) }
    }

    pub fn current(&self) -> Vec<Bookmark> {
        self.cache.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Bookmark>> {
        self.cache.subscribe()
    }

    pub async fn refresh(&self, query: &ListQuery) -> Result<(), ClientError> {
        let items = self.api.bookmarks(query).await?;
        self.cache.send_replace(items);
        Ok(())
    }

    pub async fn create(&self, draft: &BookmarkDraft) -> Result<Bookmark, ClientError> {
        let bookmark = self.api.create_bookmark(draft).await?;
        self.cache.send_modify(|items| upsert(items, bookmark.clone()));
        Ok(bookmark)
    }

    pub async fn update(&self, id: Uuid, patch: &BookmarkPatch) -> Result<Bookmark, ClientError> {
        let bookmark = self.api.update_bookmark(id, patch).await?;
        self.cache.send_modify(|items| upsert(items, bookmark.clone()));
        Ok(bookmark)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        self.api.delete_bookmark(id).await?;
        self.cache.send_modify(|items| items.retain(|bookmark| bookmark.id != id));
        Ok(())
    }
}
