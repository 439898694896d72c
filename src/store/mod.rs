//!
//! noter document store
//! --------------------
//! File-backed storage for the resource collections using a flat layout:
//! `<root>/notes/<id>.json`, `<root>/bookmarks/<id>.json`. Each collection
//! keeps an in-memory map mirror that is loaded on open and written through on
//! every mutation, so the on-disk state always matches the last completed
//! operation (concurrent writers to one id are last-write-wins).
//!
//! Key responsibilities:
//! - Owner-scoped CRUD: every read and write is filtered by the owning user.
//! - List filtering: case-insensitive substring over the searchable fields,
//!   plus all-of tag matching. No ranking; iteration order is map key order.
//! - Tolerant loading: unreadable document files are skipped with a warning.
//!
//! The public API centers on `Store`, usually wrapped in the clone-friendly
//! `SharedStore` handle.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

pub mod bookmarks;
pub mod notes;

pub use bookmarks::{Bookmark, BookmarkDraft, BookmarkPatch};
pub use notes::{Note, NoteDraft, NotePatch};

/// What a stored resource must expose for keying, owner scoping and list
/// filtering.
pub trait Document: Clone + Serialize + DeserializeOwned {
    /// Folder name of the collection under the store root.
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;
    fn owner(&self) -> Uuid;
    /// Fields scanned by the substring filter, in display order.
    fn search_fields(&self) -> Vec<&str>;
    fn tags(&self) -> &[String];
}

/// Recognized list options. Absent options impose no constraint.
#[derive(Debug, Default, Clone)]
pub struct ListFilter {
    /// Case-insensitive substring matched against any search field.
    pub q: Option<String>,
    /// Every listed tag must be present (case-sensitive exact match).
    pub tags: Vec<String>,
}

impl ListFilter {
    pub fn matches<T: Document>(&self, doc: &T) -> bool {
        if let Some(q) = &self.q {
            let needle = q.to_lowercase();
            let hit = doc
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        self.tags.iter().all(|want| doc.tags().iter().any(|have| have == want))
    }
}

/// One resource collection: a directory of JSON documents plus its in-memory
/// mirror.
pub struct Collection<T: Document> {
    dir: PathBuf,
    docs: RwLock<BTreeMap<Uuid, T>>,
}

impl<T: Document> Collection<T> {
    fn open(root: &Path) -> Result<Self> {
        let dir = root.join(T::COLLECTION);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create collection directory {}", dir.display()))?;
        let mut docs = BTreeMap::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let loaded = fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|text| serde_json::from_str::<T>(&text).map_err(anyhow::Error::from));
            match loaded {
                Ok(doc) => {
                    docs.insert(doc.id(), doc);
                }
                Err(e) => warn!("skipping unreadable document {}: {}", path.display(), e),
            }
        }
        Ok(Self { dir, docs: RwLock::new(docs) })
    }

    /// Persist and index a new document, returning the stored value.
    pub fn insert(&self, doc: T) -> Result<T> {
        self.persist(&doc)?;
        self.docs.write().insert(doc.id(), doc.clone());
        Ok(doc)
    }

    pub fn list(&self, owner: Uuid, filter: &ListFilter) -> Vec<T> {
        self.docs
            .read()
            .values()
            .filter(|doc| doc.owner() == owner && filter.matches(*doc))
            .cloned()
            .collect()
    }

    pub fn get(&self, owner: Uuid, id: Uuid) -> Option<T> {
        self.docs.read().get(&id).filter(|doc| doc.owner() == owner).cloned()
    }

    /// Apply a merge closure to an owned document. Returns `None` when the id
    /// does not resolve for this owner; the closure runs on a copy that only
    /// replaces the stored value once it has been persisted.
    pub fn update_with<F>(&self, owner: Uuid, id: Uuid, apply: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut T),
    {
        let mut map = self.docs.write();
        let Some(existing) = map.get(&id) else {
            return Ok(None);
        };
        if existing.owner() != owner {
            return Ok(None);
        }
        let mut updated = existing.clone();
        apply(&mut updated);
        self.persist(&updated)?;
        map.insert(id, updated.clone());
        Ok(Some(updated))
    }

    /// Delete an owned document. `Ok(false)` when the id does not resolve.
    pub fn remove(&self, owner: Uuid, id: Uuid) -> Result<bool> {
        let mut map = self.docs.write();
        match map.get(&id) {
            Some(doc) if doc.owner() == owner => {
                let path = self.doc_path(id);
                if path.exists() {
                    fs::remove_file(&path)
                        .with_context(|| format!("failed to delete {}", path.display()))?;
                }
                map.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Total document count across all owners.
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn doc_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn persist(&self, doc: &T) -> Result<()> {
        let path = self.doc_path(doc.id());
        let text = serde_json::to_string_pretty(doc)?;
        fs::write(&path, text)
            .with_context(|| format!("failed to write document {}", path.display()))?;
        Ok(())
    }
}

/// Drop duplicate tags, keeping the first occurrence so insertion order is
/// preserved for display.
pub(crate) fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// All resource collections rooted at one folder.
pub struct Store {
    root: PathBuf,
    pub notes: Collection<Note>,
    pub bookmarks: Collection<Bookmark>,
}

impl Store {
    /// Open a store rooted at the given filesystem path. Directories are
    /// created as needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).ok();
        let notes = Collection::open(&root)?;
        let bookmarks = Collection::open(&root)?;
        Ok(Self { root, notes, bookmarks })
    }

    /// Return the configured root folder for this Store.
    pub fn root_path(&self) -> &PathBuf {
        &self.root
    }
}

#[derive(Clone)]
pub struct SharedStore(pub Arc<Store>);

impl SharedStore {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        Ok(Self(Arc::new(Store::open(root)?)))
    }
}
