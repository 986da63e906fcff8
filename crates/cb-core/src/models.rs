//! # Domain Models
//!
//! These structs represent the core entities of a corkboard.
//! Identities are generated UUIDs and are never derived from content:
//! two uploads of the same file are two distinct images.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored binary blob (board background or post photo).
///
/// Images are referenced, not owned: any number of boards and posts may point
/// at the same image, and an image outlives all of its referrers.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub id: Uuid,
    /// Original upload filename; not unique.
    pub name: String,
    pub data: Bytes,
}

impl Image {
    /// Assigns a fresh identity to an uploaded payload.
    pub fn new(name: impl Into<String>, data: Bytes) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            data,
        }
    }
}

/// A named container of posts with an optional background image.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub background: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// The reference a post keeps to its photo.
///
/// The original filename is copied onto the post so that listing a page never
/// has to consult the image backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    pub uuid: Uuid,
    pub name: String,
}

/// A post as handed to a `PostRepo` for insertion.
///
/// `seq` and `created_at` are assigned by the storage layer at insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub id: Uuid,
    pub board_id: Uuid,
    pub name: String,
    pub message: String,
    pub photo: Option<PhotoRef>,
}

/// A persisted post.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Uuid,
    /// Insertion order within the store; breaks `created_at` ties.
    pub seq: i64,
    pub board_id: Uuid,
    pub name: String,
    pub message: String,
    pub photo: Option<PhotoRef>,
    pub created_at: DateTime<Utc>,
}

/// The client-facing shape of a post: `{name, message, photo}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub name: String,
    pub message: String,
    pub photo: Option<PhotoRef>,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            name: post.name,
            message: post.message,
            photo: post.photo,
        }
    }
}

/// Board metadata served to the client, without the posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDetails {
    pub title: String,
    pub description: String,
    /// Background image identity, `null` when the board has none.
    pub bg: Option<String>,
}

impl From<Board> for BoardDetails {
    fn from(board: Board) -> Self {
        Self {
            title: board.title,
            description: board.description,
            bg: board.background.map(|id| id.to_string()),
        }
    }
}
