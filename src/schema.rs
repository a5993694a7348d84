//! Typed wire schema for the `/api` endpoint: one tagged variant per
//! operation, validated at the boundary so malformed payloads fail fast with
//! a typed error instead of propagating missing fields into resolvers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{NoteRecord, UserRecord};

pub const DEFAULT_FEED_LIMIT: usize = 50;

/// One inbound operation. The `op` tag selects the variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ApiRequest {
    /// Public newest-first feed.
    Notes { #[serde(default)] limit: Option<usize> },
    /// Single note by id.
    Note { id: String },
    /// Notes authored by the caller.
    MyNotes,
    /// Notes the caller has favorited.
    Favorites,
    /// The caller's own profile.
    Me,
    SignUp { username: String, email: String, password: String },
    SignIn { email: String, password: String },
    NewNote { content: String },
    UpdateNote { id: String, content: String },
    DeleteNote { id: String },
    ToggleFavorite { id: String },
}

/// Response payload, tagged to mirror the request variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ApiResponse {
    Notes { notes: Vec<Note> },
    Note { note: Note },
    User { user: User },
    /// Sign-in and sign-up both answer with a freshly issued token.
    Token { token: String },
    Deleted { id: String },
}

/// A note as seen on the wire; favorite count is derived from storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub content: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorite_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub id: String,
    pub username: String,
    pub avatar: String,
}

/// A user profile as seen on the wire. The password hash never leaves storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar: String,
}

impl Note {
    pub fn from_record(note: &NoteRecord, author: Option<&UserRecord>) -> Self {
        Self {
            id: note.id.clone(),
            content: note.content.clone(),
            author: match author {
                Some(u) => Author { id: u.id.clone(), username: u.username.clone(), avatar: u.avatar.clone() },
                None => Author { id: note.author_id.clone(), username: "unknown".into(), avatar: String::new() },
            },
            created_at: note.created_at,
            updated_at: note.updated_at,
            favorite_count: note.favorited_by.len(),
        }
    }
}

impl User {
    pub fn from_record(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
        }
    }
}
