//! Bookmark resources: stored model, creation draft and partial patch.
//!
//! A bookmark is a URL plus optional descriptive text. The title is always
//! present on the stored record: when a creation request omits it the API
//! layer resolves one from the target page before the record reaches the
//! store (falling back to "Untitled").

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::{dedup_tags, Document};

/// Accepted URL shape. Only the scheme prefix is checked; anything after it
/// is taken as-is.
static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://.+").expect("static pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: Uuid,
    /// Owning user. Always assigned from the authenticated principal, never
    /// read from a request body.
    pub owner_id: Uuid,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Bookmark {
    const COLLECTION: &'static str = "bookmarks";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.owner_id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.description]
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Body of a bookmark creation request. Serializable so the typed client can
/// send the same shape the server parses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookmarkDraft {
    #[serde(default)]
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl BookmarkDraft {
    /// Check the URL before any remote fetch is attempted.
    pub fn validate(&self) -> AppResult<()> {
        if !URL_PATTERN.is_match(&self.url) {
            return Err(AppError::validation("url", "Valid URL is required"));
        }
        Ok(())
    }

    /// Whether the caller supplied a usable title of their own.
    pub fn provided_title(&self) -> Option<&str> {
        match &self.title {
            Some(t) if !t.trim().is_empty() => Some(t),
            _ => None,
        }
    }

    /// Build the stored record for the given owner. `title` is the resolved
    /// one: either the caller's or the fetched/fallback value.
    pub fn into_bookmark(self, owner_id: Uuid, title: String) -> Bookmark {
        let now = Utc::now();
        Bookmark {
            id: Uuid::new_v4(),
            owner_id,
            url: self.url,
            title,
            description: self.description,
            tags: dedup_tags(self.tags),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of a bookmark update request. Absent fields are left untouched;
/// unknown keys are rejected at deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookmarkPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl BookmarkPatch {
    pub fn validate(&self) -> AppResult<()> {
        if matches!(&self.url, Some(u) if !URL_PATTERN.is_match(u)) {
            return Err(AppError::validation("url", "Valid URL is required"));
        }
        Ok(())
    }

    /// Merge into an existing bookmark and bump its update stamp.
    pub fn apply(self, bookmark: &mut Bookmark) {
        if let Some(url) = self.url {
            bookmark.url = url;
        }
        if let Some(title) = self.title {
            bookmark.title = title;
        }
        if let Some(description) = self.description {
            bookmark.description = description;
        }
        if let Some(tags) = self.tags {
            bookmark.tags = dedup_tags(tags);
        }
        bookmark.updated_at = Utc::now();
    }
}
