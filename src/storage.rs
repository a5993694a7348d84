//!
//! notedly storage module
//! -----------------------
//! On-disk store for users and notes under a simple root-folder layout:
//! `<root>/users.json` and `<root>/notes.json`. Records are held in memory and
//! rewritten to disk on mutation; the data set is small documents, not series,
//! so whole-file rewrites are adequate.
//!
//! The public API centers around the `Store` type, which is wrapped in a
//! thread-safe `SharedStore` (`Arc<Mutex<Store>>`) shared across requests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Persisted user account. The password is stored only as an argon2 PHC hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

/// Persisted note. `favorited_by` holds user ids; the favorite count shown on
/// the wire is derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub favorited_by: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    users: Vec<UserRecord>,
    notes: Vec<NoteRecord>,
}

fn gen_id(prefix: &str) -> String {
    let mut buf = [0u8; 12];
    let _ = getrandom::getrandom(&mut buf);
    let hex: String = buf.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}{}", prefix, hex)
}

/// Core storage handle rooted at a folder. Not thread-safe by itself; always
/// accessed through `SharedStore`.
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    users: HashMap<String, UserRecord>,
    notes: HashMap<String, NoteRecord>,
}

impl Store {
    /// Open (or initialize) a store rooted at the given folder.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("creating store root {}", root.display()))?;
        let mut store = Self { root, users: HashMap::new(), notes: HashMap::new() };
        store.load()?;
        Ok(store)
    }

    pub fn root_path(&self) -> &PathBuf { &self.root }

    fn users_path(&self) -> PathBuf { self.root.join("users.json") }
    fn notes_path(&self) -> PathBuf { self.root.join("notes.json") }

    fn load(&mut self) -> Result<()> {
        if self.users_path().exists() {
            let raw = std::fs::read_to_string(self.users_path())?;
            let users: Vec<UserRecord> = serde_json::from_str(&raw)
                .with_context(|| "parsing users.json")?;
            self.users = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        }
        if self.notes_path().exists() {
            let raw = std::fs::read_to_string(self.notes_path())?;
            let notes: Vec<NoteRecord> = serde_json::from_str(&raw)
                .with_context(|| "parsing notes.json")?;
            self.notes = notes.into_iter().map(|n| (n.id.clone(), n)).collect();
        }
        debug!(target: "notedly::storage", users = self.users.len(), notes = self.notes.len(), "store loaded");
        Ok(())
    }

    fn persist_users(&self) -> Result<()> {
        let mut users: Vec<&UserRecord> = self.users.values().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        std::fs::write(self.users_path(), serde_json::to_string_pretty(&users)?)?;
        Ok(())
    }

    fn persist_notes(&self) -> Result<()> {
        let mut notes: Vec<&NoteRecord> = self.notes.values().collect();
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        std::fs::write(self.notes_path(), serde_json::to_string_pretty(&notes)?)?;
        Ok(())
    }

    // --- users ---

    /// Insert a new user. Returns None when the username or email is already
    /// taken (case-insensitive); the caller decides how to surface that.
    pub fn create_user(&mut self, username: &str, email: &str, password_hash: &str, avatar: &str) -> Result<Option<UserRecord>> {
        let uname = username.to_lowercase();
        let mail = email.to_lowercase();
        let taken = self.users.values().any(|u| {
            u.username.to_lowercase() == uname || u.email.to_lowercase() == mail
        });
        if taken {
            return Ok(None);
        }
        let user = UserRecord {
            id: gen_id("u"),
            username: username.to_string(),
            email: mail,
            password_hash: password_hash.to_string(),
            avatar: avatar.to_string(),
            created_at: Utc::now(),
        };
        self.users.insert(user.id.clone(), user.clone());
        self.persist_users()?;
        Ok(Some(user))
    }

    pub fn user_by_id(&self, id: &str) -> Option<&UserRecord> {
        self.users.get(id)
    }

    pub fn user_by_email(&self, email: &str) -> Option<&UserRecord> {
        let mail = email.to_lowercase();
        self.users.values().find(|u| u.email == mail)
    }

    // --- notes ---

    pub fn create_note(&mut self, author_id: &str, content: &str) -> Result<NoteRecord> {
        let now = Utc::now();
        let note = NoteRecord {
            id: gen_id("n"),
            author_id: author_id.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
            favorited_by: Vec::new(),
        };
        self.notes.insert(note.id.clone(), note.clone());
        self.persist_notes()?;
        Ok(note)
    }

    pub fn note(&self, id: &str) -> Option<&NoteRecord> {
        self.notes.get(id)
    }

    /// Newest-first feed, capped at `limit`.
    pub fn notes_newest_first(&self, limit: usize) -> Vec<NoteRecord> {
        let mut all: Vec<&NoteRecord> = self.notes.values().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.into_iter().take(limit).cloned().collect()
    }

    pub fn notes_by_author(&self, author_id: &str) -> Vec<NoteRecord> {
        let mut mine: Vec<&NoteRecord> = self.notes.values().filter(|n| n.author_id == author_id).collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine.into_iter().cloned().collect()
    }

    pub fn notes_favorited_by(&self, user_id: &str) -> Vec<NoteRecord> {
        let mut favs: Vec<&NoteRecord> = self
            .notes
            .values()
            .filter(|n| n.favorited_by.iter().any(|u| u == user_id))
            .collect();
        favs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        favs.into_iter().cloned().collect()
    }

    pub fn update_note(&mut self, id: &str, content: &str) -> Result<Option<NoteRecord>> {
        let updated = match self.notes.get_mut(id) {
            Some(note) => {
                note.content = content.to_string();
                note.updated_at = Utc::now();
                Some(note.clone())
            }
            None => None,
        };
        if updated.is_some() {
            self.persist_notes()?;
        }
        Ok(updated)
    }

    pub fn delete_note(&mut self, id: &str) -> Result<bool> {
        let removed = self.notes.remove(id).is_some();
        if removed {
            self.persist_notes()?;
        }
        Ok(removed)
    }

    /// Flip the caller's favorite mark on a note. Returns the updated note,
    /// or None when the note does not exist.
    pub fn toggle_favorite(&mut self, id: &str, user_id: &str) -> Result<Option<NoteRecord>> {
        let updated = match self.notes.get_mut(id) {
            Some(note) => {
                if let Some(pos) = note.favorited_by.iter().position(|u| u == user_id) {
                    note.favorited_by.remove(pos);
                } else {
                    note.favorited_by.push(user_id.to_string());
                }
                Some(note.clone())
            }
            None => None,
        };
        if updated.is_some() {
            self.persist_notes()?;
        }
        Ok(updated)
    }
}

/// Thread-safe handle shared across requests. Lock, operate, release; never
/// hold the guard across an await point.
#[derive(Debug, Clone)]
pub struct SharedStore(pub Arc<Mutex<Store>>);

impl SharedStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        Ok(Self(Arc::new(Mutex::new(Store::new(root)?))))
    }
}
