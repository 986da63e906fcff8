//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be used by the binary.
//! Each entity gets its own repository so the image backend can be swapped
//! (database BLOB column, filesystem) without touching boards or posts.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Board, Image, NewPost, Post};

/// Persistence contract for boards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardRepo: Send + Sync {
    async fn create_board(&self, board: &Board) -> anyhow::Result<()>;
    async fn get_board(&self, id: Uuid) -> anyhow::Result<Option<Board>>;
    async fn list_boards(&self) -> anyhow::Result<Vec<Board>>;
    /// Deletes the board and, by cascade, all of its posts.
    /// Returns `false` when no such board existed.
    async fn delete_board(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Persistence contract for posts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Appends a post, stamping `seq` and `created_at` atomically with the insert.
    async fn insert_post(&self, post: NewPost) -> anyhow::Result<Post>;

    /// Returns the `[offset, offset + limit)` window of a board's posts,
    /// ordered by `created_at` descending, then `seq` descending.
    async fn list_posts(&self, board_id: Uuid, offset: u64, limit: u64) -> anyhow::Result<Vec<Post>>;
}

/// Binary storage contract for uploaded images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persists the image under its already assigned identity.
    async fn put_image(&self, image: &Image) -> anyhow::Result<()>;
    async fn get_image(&self, id: Uuid) -> anyhow::Result<Option<Image>>;
}
