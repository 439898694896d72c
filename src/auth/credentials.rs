//! Persisted user records with argon2id password hashing.
//! Users live as one JSON file per record under `<root>/users/` and are
//! mirrored into memory at open. Plaintext passwords exist only on the stack
//! during register/login and are never persisted or logged.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// PHC-format argon2id string, e.g. `$argon2id$v=19$...`. Stored on disk,
    /// never exposed through the API.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

pub struct CredentialStore {
    dir: PathBuf,
    /// Keyed by lowercased email; uniqueness is case-insensitive.
    users: RwLock<HashMap<String, User>>,
}

impl CredentialStore {
    /// Open (or create) the user directory under the store root and load all
    /// existing records. Unreadable files are skipped with a warning so one
    /// corrupt record cannot take the whole service down.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let dir = root.as_ref().join("users");
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create user directory {}", dir.display()))?;
        let mut users = HashMap::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path).map_err(anyhow::Error::from).and_then(|text| {
                serde_json::from_str::<User>(&text).map_err(anyhow::Error::from)
            }) {
                Ok(user) => {
                    users.insert(user.email.to_lowercase(), user);
                }
                Err(e) => warn!("skipping unreadable user record {}: {}", path.display(), e),
            }
        }
        Ok(Self { dir, users: RwLock::new(users) })
    }

    /// Create a user. Fails with `Conflict` when the email is already taken;
    /// shape validation (empty fields etc.) belongs to the API layer.
    pub fn register(&self, name: &str, email: &str, password: &str) -> AppResult<User> {
        let key = email.to_lowercase();
        if self.users.read().contains_key(&key) {
            return Err(AppError::conflict("Email already registered"));
        }
        // Hashing is deliberately slow; keep it outside the lock.
        let password_hash =
            hash_password(password).map_err(|e| AppError::internal(e.to_string()))?;
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            created_at: Utc::now(),
        };
        {
            let mut map = self.users.write();
            if map.contains_key(&key) {
                return Err(AppError::conflict("Email already registered"));
            }
            // Persist before the memory commit so the map never holds a user
            // that is not on disk.
            self.persist(&user).map_err(|e| AppError::internal(e.to_string()))?;
            map.insert(key, user.clone());
        }
        Ok(user)
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.read().get(&email.to_lowercase()).cloned()
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<User> {
        self.users.read().values().find(|u| u.id == id).cloned()
    }

    /// Check credentials. Unknown email and wrong password are indistinguishable
    /// to the caller.
    pub fn verify_login(&self, email: &str, password: &str) -> Option<User> {
        let user = self.find_by_email(email)?;
        if verify_password(&user.password_hash, password) {
            Some(user)
        } else {
            None
        }
    }

    fn persist(&self, user: &User) -> Result<()> {
        let path = self.dir.join(format!("{}.json", user.id));
        let text = serde_json::to_string_pretty(user)?;
        fs::write(&path, text)
            .with_context(|| format!("failed to write user record {}", path.display()))?;
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!("salt generation failed: {e}"))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!("salt encoding failed: {e}"))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {e}"))?;
    Ok(phc.to_string())
}

fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}
