//! Resource API integration tests: notes and bookmarks CRUD, list filtering,
//! owner scoping and the bookmark title autofill, all over a live server.

use anyhow::Result;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tempfile::tempdir;

use noter::config::Config;
use noter::server::{run_with_listener, AppState};

async fn spawn_server(tmp: &std::path::Path) -> (String, AppState) {
    let config = Config {
        http_port: 0,
        db_folder: tmp.display().to_string(),
        token_secret: b"http-api-test-secret".to_vec(),
        token_ttl: chrono::Duration::hours(1),
        fetch_timeout: std::time::Duration::from_millis(500),
    };
    let state = AppState::new(&config).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serving = state.clone();
    tokio::spawn(async move {
        let _ = run_with_listener(listener, serving).await;
    });
    (format!("http://{}", addr), state)
}

/// Tiny page server so title fetches have something real to scrape.
async fn spawn_page(html: &'static str) -> String {
    let app = Router::new().route("/", get(move || async move { Html(html) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

/// Register an account and return an authenticated token for it.
async fn account(client: &reqwest::Client, base: &str, email: &str) -> String {
    let resp = client
        .post(format!("{base}/api/auth/signup"))
        .json(&json!({"name": "Tester", "email": email, "password": "longenough"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let resp = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({"email": email, "password": "longenough"}))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn note_crud_roundtrip() -> Result<()> {
    let tmp = tempdir()?;
    let (base, _state) = spawn_server(tmp.path()).await;
    let client = reqwest::Client::new();
    let token = account(&client, &base, "crud@example.com").await;

    let resp = client
        .post(format!("{base}/api/notes"))
        .bearer_auth(&token)
        .json(&json!({"title": "groceries", "content": "milk and eggs", "tags": ["home", "food"]}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 201);
    let note: Value = resp.json().await?;
    let id = note["id"].as_str().unwrap().to_string();
    assert_eq!(note["title"], "groceries");
    assert_eq!(note["tags"], json!(["home", "food"]));
    assert!(note["createdAt"].is_string());

    let fetched: Value = client
        .get(format!("{base}/api/notes/{id}"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(fetched["content"], "milk and eggs");

    // Partial update: untouched fields keep their values.
    let updated: Value = client
        .put(format!("{base}/api/notes/{id}"))
        .bearer_auth(&token)
        .json(&json!({"content": "milk, eggs, flour"}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(updated["title"], "groceries");
    assert_eq!(updated["content"], "milk, eggs, flour");

    let resp = client.delete(format!("{base}/api/notes/{id}")).bearer_auth(&token).send().await?;
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await?;
    assert_eq!(body["message"], "Note deleted");

    let resp = client.get(format!("{base}/api/notes/{id}")).bearer_auth(&token).send().await?;
    assert_eq!(resp.status().as_u16(), 404);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], "Note not found");
    Ok(())
}

#[tokio::test]
async fn note_validation_and_unknown_patch_keys() -> Result<()> {
    let tmp = tempdir()?;
    let (base, state) = spawn_server(tmp.path()).await;
    let client = reqwest::Client::new();
    let token = account(&client, &base, "validation@example.com").await;

    let resp = client
        .post(format!("{base}/api/notes"))
        .bearer_auth(&token)
        .json(&json!({"title": "", "content": "something"}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);
    let err: Value = resp.json().await?;
    assert_eq!(err["error"], "Title is required");
    // Nothing was stored.
    assert_eq!(state.store.0.notes.len(), 0);

    let created: Value = client
        .post(format!("{base}/api/notes"))
        .bearer_auth(&token)
        .json(&json!({"title": "kept", "content": "kept"}))
        .send()
        .await?
        .json()
        .await?;
    let id = created["id"].as_str().unwrap();

    // A key outside the patch shape must fail the whole request.
    let resp = client
        .put(format!("{base}/api/notes/{id}"))
        .bearer_auth(&token)
        .json(&json!({"title": "new", "color": "red"}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);
    let err: Value = resp.json().await?;
    assert!(err["error"].as_str().unwrap().contains("color"));

    // And the record is unchanged.
    let after: Value = client
        .get(format!("{base}/api/notes/{id}"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(after["title"], "kept");
    Ok(())
}

#[tokio::test]
async fn list_filters_combine_over_http() -> Result<()> {
    let tmp = tempdir()?;
    let (base, _state) = spawn_server(tmp.path()).await;
    let client = reqwest::Client::new();
    let token = account(&client, &base, "filters@example.com").await;

    for (title, content, tags) in [
        ("Release plan", "ship the api", vec!["work", "rust"]),
        ("Release party", "bring cake", vec!["fun"]),
        ("Journal", "quiet day", vec!["personal"]),
    ] {
        let resp = client
            .post(format!("{base}/api/notes"))
            .bearer_auth(&token)
            .json(&json!({"title": title, "content": content, "tags": tags}))
            .send()
            .await?;
        assert_eq!(resp.status().as_u16(), 201);
    }

    let all: Vec<Value> = client
        .get(format!("{base}/api/notes"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(all.len(), 3);

    // Substring match is case-insensitive and reaches into content.
    let hits: Vec<Value> = client
        .get(format!("{base}/api/notes?q=CAKE"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "Release party");

    // Tags are all-of.
    let hits: Vec<Value> = client
        .get(format!("{base}/api/notes?tags=work,rust"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "Release plan");

    // Both constraints at once.
    let hits: Vec<Value> = client
        .get(format!("{base}/api/notes?q=release&tags=fun"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "Release party");

    let hits: Vec<Value> = client
        .get(format!("{base}/api/notes?q=release&tags=personal"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert!(hits.is_empty());
    Ok(())
}

#[tokio::test]
async fn unauthenticated_requests_change_nothing() -> Result<()> {
    let tmp = tempdir()?;
    let (base, state) = spawn_server(tmp.path()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/notes"))
        .json(&json!({"title": "sneaky", "content": "no token"}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 401);
    let body: Value = resp.json().await?;
    assert_eq!(body["message"], "Not authorized");
    assert_eq!(state.store.0.notes.len(), 0);

    let resp = client.get(format!("{base}/api/bookmarks")).send().await?;
    assert_eq!(resp.status().as_u16(), 401);
    Ok(())
}

#[tokio::test]
async fn owners_cannot_see_each_other() -> Result<()> {
    let tmp = tempdir()?;
    let (base, _state) = spawn_server(tmp.path()).await;
    let client = reqwest::Client::new();
    let alice = account(&client, &base, "alice@example.com").await;
    let bob = account(&client, &base, "bob@example.com").await;

    let note: Value = client
        .post(format!("{base}/api/notes"))
        .bearer_auth(&alice)
        .json(&json!({"title": "secret", "content": "alice only"}))
        .send()
        .await?
        .json()
        .await?;
    let id = note["id"].as_str().unwrap();

    let bobs: Vec<Value> = client
        .get(format!("{base}/api/notes"))
        .bearer_auth(&bob)
        .send()
        .await?
        .json()
        .await?;
    assert!(bobs.is_empty());

    // By-id access from the other account reads as absent, not forbidden.
    let resp = client.get(format!("{base}/api/notes/{id}")).bearer_auth(&bob).send().await?;
    assert_eq!(resp.status().as_u16(), 404);
    let resp = client.delete(format!("{base}/api/notes/{id}")).bearer_auth(&bob).send().await?;
    assert_eq!(resp.status().as_u16(), 404);

    let resp = client.get(format!("{base}/api/notes/{id}")).bearer_auth(&alice).send().await?;
    assert_eq!(resp.status().as_u16(), 200);
    Ok(())
}

#[tokio::test]
async fn bookmark_title_autofill_and_fallback() -> Result<()> {
    let tmp = tempdir()?;
    let (base, _state) = spawn_server(tmp.path()).await;
    let client = reqwest::Client::new();
    let token = account(&client, &base, "bookmarks@example.com").await;

    let page = spawn_page("<html><head><title>  Stub   Page </title></head></html>").await;
    let bookmark: Value = client
        .post(format!("{base}/api/bookmarks"))
        .bearer_auth(&token)
        .json(&json!({"url": page}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(bookmark["title"], "Stub Page");

    // A caller-provided title skips the fetch result.
    let bookmark: Value = client
        .post(format!("{base}/api/bookmarks"))
        .bearer_auth(&token)
        .json(&json!({"url": page, "title": "My Own"}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(bookmark["title"], "My Own");

    // Unreachable target falls back rather than failing the create.
    let bookmark: Value = client
        .post(format!("{base}/api/bookmarks"))
        .bearer_auth(&token)
        .json(&json!({"url": "http://127.0.0.1:1/nothing-here"}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(bookmark["title"], "Untitled");

    // So does a page without a usable title element.
    let bare = spawn_page("<html><head><title></title></head></html>").await;
    let bookmark: Value = client
        .post(format!("{base}/api/bookmarks"))
        .bearer_auth(&token)
        .json(&json!({"url": bare}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(bookmark["title"], "Untitled");
    Ok(())
}

#[tokio::test]
async fn bookmark_url_validation_over_http() -> Result<()> {
    let tmp = tempdir()?;
    let (base, state) = spawn_server(tmp.path()).await;
    let client = reqwest::Client::new();
    let token = account(&client, &base, "urls@example.com").await;

    for bad in ["notaurl", "ftp://files.example.com", ""] {
        let resp = client
            .post(format!("{base}/api/bookmarks"))
            .bearer_auth(&token)
            .json(&json!({"url": bad}))
            .send()
            .await?;
        assert_eq!(resp.status().as_u16(), 400, "url {bad:?}");
        let err: Value = resp.json().await?;
        assert_eq!(err["error"], "Valid URL is required");
    }
    assert_eq!(state.store.0.bookmarks.len(), 0);

    // The same rule applies when patching an existing record.
    let page = spawn_page("<title>ok</title>").await;
    let created: Value = client
        .post(format!("{base}/api/bookmarks"))
        .bearer_auth(&token)
        .json(&json!({"url": page, "title": "t"}))
        .send()
        .await?
        .json()
        .await?;
    let id = created["id"].as_str().unwrap();
    let resp = client
        .put(format!("{base}/api/bookmarks/{id}"))
        .bearer_auth(&token)
        .json(&json!({"url": "bogus"}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);
    Ok(())
}

#[tokio::test]
async fn bookmark_delete_message_matches_resource() -> Result<()> {
    let tmp = tempdir()?;
    let (base, _state) = spawn_server(tmp.path()).await;
    let client = reqwest::Client::new();
    let token = account(&client, &base, "delete@example.com").await;

    let created: Value = client
        .post(format!("{base}/api/bookmarks"))
        .bearer_auth(&token)
        .json(&json!({"url": "http://127.0.0.1:1/", "title": "kept"}))
        .send()
        .await?
        .json()
        .await?;
    let id = created["id"].as_str().unwrap();

    let body: Value = client
        .delete(format!("{base}/api/bookmarks/{id}"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["message"], "Bookmark deleted");

    let resp = client.delete(format!("{base}/api/bookmarks/{id}")).bearer_auth(&token).send().await?;
    assert_eq!(resp.status().as_u16(), 404);
    let err: Value = resp.json().await?;
    assert_eq!(err["error"], "Bookmark not found");
    Ok(())
}
