//!
//! noter CLI binary
//! ----------------
//! Command-line tool for working with a running noter server through the
//! typed client: account signup, notes and bookmarks CRUD, with list
//! filtering. Results are printed as pretty JSON.

use std::env;

use anyhow::{anyhow, Context, Result};
use uuid::Uuid;

use noter::client::{ApiClient, ListQuery};
use noter::store::{BookmarkDraft, BookmarkPatch, NoteDraft, NotePatch};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--server URL] --email E --password P <command>\n\nCommands:\n  signup --name NAME                          register an account\n  me                                          show the logged-in account\n  notes list [--q TEXT] [--tags a,b]          list notes (all filters must match)\n  notes add --title T --content C [--tags a,b]\n  notes show <id>\n  notes edit <id> [--title T] [--content C] [--tags a,b]\n  notes rm <id>\n  bookmarks list [--q TEXT] [--tags a,b]\n  bookmarks add --url URL [--title T] [--description D] [--tags a,b]\n  bookmarks show <id>\n  bookmarks edit <id> [--url URL] [--title T] [--description D] [--tags a,b]\n  bookmarks rm <id>\n\nFlags:\n  --server URL     Server base URL (env: NOTER_SERVER, default http://127.0.0.1:5000)\n  --email E        Account email (env: NOTER_EMAIL)\n  --password P     Account password (env: NOTER_PASSWORD)\n  -h, --help       Show this help\n\nExamples:\n  {program} --email me@home.net --password secret123 signup --name Me\n  {program} --email me@home.net --password secret123 notes add --title groceries --content \"milk, eggs\" --tags home\n  {program} --email me@home.net --password secret123 notes list --q milk --tags home\n  {program} --email me@home.net --password secret123 bookmarks add --url https://docs.rs"
    );
}

/// Flags that always take a value; skipped when collecting positionals.
const VALUE_FLAGS: &[&str] = &[
    "--server",
    "--email",
    "--password",
    "--name",
    "--title",
    "--content",
    "--description",
    "--url",
    "--tags",
    "--q",
];

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn positionals(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let a = &args[i];
        if VALUE_FLAGS.contains(&a.as_str()) {
            i += 2;
            continue;
        }
        if a.starts_with('-') {
            i += 1;
            continue;
        }
        out.push(a.clone());
        i += 1;
    }
    out
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',').map(|t| t.to_string()).collect()
}

fn list_query(args: &[String]) -> ListQuery {
    ListQuery {
        q: arg_value(args, "--q"),
        tags: arg_value(args, "--tags").map(|t| split_tags(&t)).unwrap_or_default(),
    }
}

fn parse_id(pos: &[String]) -> Result<Uuid> {
    let raw = pos.get(2).ok_or_else(|| anyhow!("missing <id> argument"))?;
    Uuid::parse_str(raw).with_context(|| format!("invalid id: {raw}"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || has_flag(&args, "--help") || has_flag(&args, "-h") {
        print_usage("noter_cli");
        return Ok(());
    }

    let server = arg_value(&args, "--server")
        .or_else(|| env::var("NOTER_SERVER").ok())
        .unwrap_or_else(|| "http://127.0.0.1:5000".to_string());
    let email = arg_value(&args, "--email")
        .or_else(|| env::var("NOTER_EMAIL").ok())
        .ok_or_else(|| anyhow!("--email is required (or set NOTER_EMAIL)"))?;
    let password = arg_value(&args, "--password")
        .or_else(|| env::var("NOTER_PASSWORD").ok())
        .ok_or_else(|| anyhow!("--password is required (or set NOTER_PASSWORD)"))?;

    let client = ApiClient::new(&server)?;
    let pos = positionals(&args);

    // Signup is the one command that runs without a prior login.
    if pos.first().map(String::as_str) == Some("signup") {
        let name = arg_value(&args, "--name").ok_or_else(|| anyhow!("signup needs --name"))?;
        let account = client.signup(&name, &email, &password).await?;
        return print_json(&account);
    }

    client.login(&email, &password).await?;

    match (pos.first().map(String::as_str), pos.get(1).map(String::as_str)) {
        (Some("me"), _) => {
            let account = client.me().await?;
            print_json(&account)
        }
        (Some("notes"), Some("list")) => {
            let notes = client.notes(&list_query(&args)).await?;
            print_json(&notes)
        }
        (Some("notes"), Some("add")) => {
            let draft = NoteDraft {
                title: arg_value(&args, "--title").unwrap_or_default(),
                content: arg_value(&args, "--content").unwrap_or_default(),
                tags: arg_value(&args, "--tags").map(|t| split_tags(&t)).unwrap_or_default(),
            };
            let note = client.create_note(&draft).await?;
            print_json(&note)
        }
        (Some("notes"), Some("show")) => {
            let note = client.note(parse_id(&pos)?).await?;
            print_json(&note)
        }
        (Some("notes"), Some("edit")) => {
            let patch = NotePatch {
                title: arg_value(&args, "--title"),
                content: arg_value(&args, "--content"),
                tags: arg_value(&args, "--tags").map(|t| split_tags(&t)),
            };
            let note = client.update_note(parse_id(&pos)?, &patch).await?;
            print_json(&note)
        }
        (Some("notes"), Some("rm")) => {
            let id = parse_id(&pos)?;
            client.delete_note(id).await?;
            println!("deleted {id}");
            Ok(())
        }
        (Some("bookmarks"), Some("list")) => {
            let bookmarks = client.bookmarks(&list_query(&args)).await?;
            print_json(&bookmarks)
        }
        (Some("bookmarks"), Some("add")) => {
            let draft = BookmarkDraft {
                url: arg_value(&args, "--url").unwrap_or_default(),
                title: arg_value(&args, "--title"),
                description: arg_value(&args, "--description").unwrap_or_default(),
                tags: arg_value(&args, "--tags").map(|t| split_tags(&t)).unwrap_or_default(),
            };
            let bookmark = client.create_bookmark(&draft).await?;
            print_json(&bookmark)
        }
        (Some("bookmarks"), Some("show")) => {
            let bookmark = client.bookmark(parse_id(&pos)?).await?;
            print_json(&bookmark)
        }
        (Some("bookmarks"), Some("edit")) => {
            let patch = BookmarkPatch {
                url: arg_value(&args, "--url"),
                title: arg_value(&args, "--title"),
                description: arg_value(&args, "--description"),
                tags: arg_value(&args, "--tags").map(|t| split_tags(&t)),
            };
            let bookmark = client.update_bookmark(parse_id(&pos)?, &patch).await?;
            print_json(&bookmark)
        }
        (Some("bookmarks"), Some("rm")) => {
            let id = parse_id(&pos)?;
            client.delete_bookmark(id).await?;
            println!("deleted {id}");
            Ok(())
        }
        _ => {
            print_usage("noter_cli");
            Err(anyhow!("unknown command: {}", pos.join(" ")))
        }
    }
}
