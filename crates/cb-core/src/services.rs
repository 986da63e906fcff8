//! # BoardService
//!
//! Orchestrates the ports for every operation a client or operator can run:
//! reading board details, paging posts, creating posts, serving images.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Board, BoardDetails, Image, NewPost, PhotoRef, PostView};
use crate::traits::{BoardRepo, ImageStore, PostRepo};
use crate::validation::{BoardForm, PostForm, Upload, ValidationErrors};

/// Runs form validation on the blocking pool; image decoding would otherwise
/// stall every request sharing the worker.
async fn validate_off_executor<T, F>(check: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, ValidationErrors> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(check)
        .await
        .map_err(|e| AppError::Internal(format!("validation task failed: {e}")))?
        .map_err(AppError::from)
}

/// Parses a client-supplied identifier.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::InvalidInput(format!("malformed {what} identifier: {raw:?}")))
}

#[derive(Clone)]
pub struct BoardService {
    boards: Arc<dyn BoardRepo>,
    posts: Arc<dyn PostRepo>,
    images: Arc<dyn ImageStore>,
}

impl BoardService {
    pub fn new(
        boards: Arc<dyn BoardRepo>,
        posts: Arc<dyn PostRepo>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self { boards, posts, images }
    }

    /// Title, description and background of a board.
    pub async fn get_board_details(&self, board_id: &str) -> Result<BoardDetails> {
        let id = parse_id(board_id, "board")?;
        let board = self
            .boards
            .get_board(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Board", id.to_string()))?;
        Ok(board.into())
    }

    /// The `[index, index + amount)` window of a board's posts, newest first.
    ///
    /// A window past the end is empty; a window overlapping the end is short.
    pub async fn get_posts(&self, board_id: &str, index: i64, amount: i64) -> Result<Vec<PostView>> {
        let id = parse_id(board_id, "board")?;
        let offset = u64::try_from(index)
            .map_err(|_| AppError::InvalidInput(format!("index must be >= 0, got {index}")))?;
        let limit = u64::try_from(amount)
            .map_err(|_| AppError::InvalidInput(format!("amount must be >= 0, got {amount}")))?;

        if self.boards.get_board(id).await?.is_none() {
            return Err(AppError::NotFound("Board", id.to_string()));
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let posts = self.posts.list_posts(id, offset, limit).await?;
        Ok(posts.into_iter().map(PostView::from).collect())
    }

    /// Validates and stores a post, storing its photo first when present.
    ///
    /// An identifier that is malformed or names no board is reported as
    /// `NotFound`. If the post insert fails after the photo was stored, the
    /// photo stays behind as an orphan.
    pub async fn create_post(&self, board_id: &str, form: PostForm) -> Result<PostView> {
        let board = match Uuid::parse_str(board_id.trim()) {
            Ok(id) => self.boards.get_board(id).await?,
            Err(_) => None,
        }
        .ok_or_else(|| AppError::NotFound("Board", board_id.to_string()))?;

        let clean = validate_off_executor(move || form.validate()).await?;

        let photo = match clean.photo {
            Some(upload) => {
                let image = self.store_upload(upload).await?;
                Some(PhotoRef {
                    uuid: image.id,
                    name: image.name,
                })
            }
            None => None,
        };

        let post = self
            .posts
            .insert_post(NewPost {
                id: Uuid::now_v7(),
                board_id: board.id,
                name: clean.name,
                message: clean.message,
                photo,
            })
            .await?;

        log::info!(
            "post {} created on board {} (photo: {})",
            post.id,
            board.id,
            post.photo.is_some()
        );
        Ok(post.into())
    }

    /// Raw bytes and original filename of a stored image.
    pub async fn get_image(&self, image_id: &str) -> Result<Image> {
        let id = parse_id(image_id, "image")?;
        self.images
            .get_image(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Image", id.to_string()))
    }

    pub async fn create_board(&self, form: BoardForm) -> Result<Board> {
        let form = validate_off_executor(move || form.validate()).await?;

        let background = match form.background {
            Some(upload) => Some(self.store_upload(upload).await?.id),
            None => None,
        };

        let board = Board {
            id: Uuid::now_v7(),
            title: form.title,
            description: form.description,
            background,
            created_at: Utc::now(),
        };
        self.boards.create_board(&board).await?;

        log::info!("board {} created: {:?}", board.id, board.title);
        Ok(board)
    }

    pub async fn list_boards(&self) -> Result<Vec<Board>> {
        Ok(self.boards.list_boards().await?)
    }

    /// Removes a board and its posts. Referenced images are kept.
    pub async fn delete_board(&self, board_id: &str) -> Result<()> {
        let id = parse_id(board_id, "board")?;
        if !self.boards.delete_board(id).await? {
            return Err(AppError::NotFound("Board", id.to_string()));
        }
        log::info!("board {id} deleted");
        Ok(())
    }

    async fn store_upload(&self, upload: Upload) -> Result<Image> {
        let image = Image::new(upload.filename, upload.data);
        self.images.put_image(&image).await?;
        log::debug!("image {} stored ({} bytes)", image.id, image.data.len());
        Ok(image)
    }
}
