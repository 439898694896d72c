//! Note resources: stored model, creation draft and partial patch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::{dedup_tags, Document};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    /// Owning user. Always assigned from the authenticated principal, never
    /// read from a request body.
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Note {
    const COLLECTION: &'static str = "notes";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.owner_id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.content]
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Body of a note creation request. Serializable so the typed client can
/// send the same shape the server parses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NoteDraft {
    /// Validate and build the stored record for the given owner.
    pub fn into_note(self, owner_id: Uuid) -> AppResult<Note> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("title", "Title is required"));
        }
        if self.content.trim().is_empty() {
            return Err(AppError::validation("content", "Content is required"));
        }
        let now = Utc::now();
        Ok(Note {
            id: Uuid::new_v4(),
            owner_id,
            title: self.title,
            content: self.content,
            tags: dedup_tags(self.tags),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Body of a note update request. Absent fields are left untouched; unknown
/// keys are rejected at deserialization instead of being silently dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl NotePatch {
    /// Check the fields that are present before any merge happens.
    pub fn validate(&self) -> AppResult<()> {
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(AppError::validation("title", "Title cannot be empty"));
        }
        if matches!(&self.content, Some(c) if c.trim().is_empty()) {
            return Err(AppError::validation("content", "Content cannot be empty"));
        }
        Ok(())
    }

    /// Merge into an existing note and bump its update stamp.
    pub fn apply(self, note: &mut Note) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(content) = self.content {
            note.content = content;
        }
        if let Some(tags) = self.tags {
            note.tags = dedup_tags(tags);
        }
        note.updated_at = Utc::now();
    }
}
