//! Environment-driven configuration.
//! Every knob is a `NOTER_*` variable with a default suited to a local
//! single-user install. Fallbacks are logged so a misconfigured deployment
//! shows up in the startup output rather than as silent behavior.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the HTTP API (NOTER_HTTP_PORT, default 5000).
    pub http_port: u16,
    /// Root folder for users/notes/bookmarks documents (NOTER_DB_FOLDER).
    pub db_folder: String,
    /// HMAC key for bearer tokens (NOTER_TOKEN_SECRET).
    pub token_secret: Vec<u8>,
    /// Token lifetime (NOTER_TOKEN_TTL_HOURS, default one week).
    pub token_ttl: chrono::Duration,
    /// Upper bound on the bookmark title fetch (NOTER_FETCH_TIMEOUT_MS).
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn load() -> Self {
        let ttl_hours: i64 = try_load("NOTER_TOKEN_TTL_HOURS", "168");
        let fetch_ms: u64 = try_load("NOTER_FETCH_TIMEOUT_MS", "4000");
        Self {
            http_port: try_load("NOTER_HTTP_PORT", "5000"),
            db_folder: try_load("NOTER_DB_FOLDER", "data"),
            token_secret: load_token_secret(),
            token_ttl: chrono::Duration::hours(ttl_hours),
            fetch_timeout: Duration::from_millis(fetch_ms),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = match env::var(key) {
        Ok(v) => v,
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default.to_string()
        }
    };
    match raw.parse() {
        Ok(v) => v,
        Err(e) => {
            warn!("Invalid {key} value '{raw}': {e}; falling back to {default}");
            default.parse().unwrap_or_else(|e| panic!("default for {key} must parse: {e}"))
        }
    }
}

/// Missing secret falls back to a random per-process key. Tokens then stop
/// verifying after a restart, which is acceptable for a dev install but worth
/// a loud warning. A signing key must never be all zeroes, so an unavailable
/// OS RNG fails startup instead of being ignored.
fn load_token_secret() -> Vec<u8> {
    match env::var("NOTER_TOKEN_SECRET") {
        Ok(s) if !s.trim().is_empty() => s.into_bytes(),
        _ => {
            warn!("NOTER_TOKEN_SECRET not set; using a random per-process secret");
            let mut buf = [0u8; 32];
            getrandom::getrandom(&mut buf).expect("OS RNG unavailable");
            buf.to_vec()
        }
    }
}
