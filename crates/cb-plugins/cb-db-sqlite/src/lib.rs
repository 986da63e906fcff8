//! # cb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `cb-core` domain models. A single pool backs all three ports; images
//! live in a BLOB column so the server needs no writable filesystem.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cb_core::models::{Board, Image, NewPost, PhotoRef, Post};
use cb_core::traits::{BoardRepo, ImageStore, PostRepo};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS images (
        id          BLOB PRIMARY KEY NOT NULL,
        name        TEXT NOT NULL,
        data        BLOB NOT NULL,
        created_at  INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS boards (
        id          BLOB PRIMARY KEY NOT NULL,
        title       TEXT NOT NULL,
        description TEXT NOT NULL,
        background  BLOB,
        created_at  INTEGER NOT NULL
    )",
    // `seq` records insertion order and breaks created_at ties.
    // photo_id carries no foreign key: the image may live outside this database.
    "CREATE TABLE IF NOT EXISTS posts (
        seq         INTEGER PRIMARY KEY AUTOINCREMENT,
        id          BLOB NOT NULL UNIQUE,
        board_id    BLOB NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
        name        TEXT NOT NULL DEFAULT '',
        message     TEXT NOT NULL DEFAULT '',
        photo_id    BLOB,
        photo_name  TEXT,
        created_at  INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS posts_board_order
        ON posts (board_id, created_at DESC, seq DESC)",
];

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url` and applies the schema.
    ///
    /// In-memory databases are pinned to one long-lived connection, since every
    /// new connection to `sqlite::memory:` would see an empty database.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let mut pool = SqlitePoolOptions::new();
        if url.contains(":memory:") {
            pool = pool
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        } else {
            // Writers queue on the busy timeout; readers never block them.
            options = options.journal_mode(SqliteJournalMode::Wal);
            pool = pool.max_connections(8);
        }

        let store = Self {
            pool: pool.connect_with(options).await?,
        };
        store.migrate().await?;
        log::info!("sqlite store ready at {url}");
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

// Helpers for UUID and timestamp conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Ok(Uuid::from_slice(blob)?)
}

fn micros_to_time(micros: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| anyhow::anyhow!("timestamp out of range: {micros}"))
}

fn row_to_board(row: &SqliteRow) -> anyhow::Result<Board> {
    let background: Option<Vec<u8>> = row.try_get("background")?;
    Ok(Board {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        background: background.as_deref().map(blob_to_uuid).transpose()?,
        created_at: micros_to_time(row.try_get("created_at")?)?,
    })
}

fn row_to_post(row: &SqliteRow) -> anyhow::Result<Post> {
    let photo_id: Option<Vec<u8>> = row.try_get("photo_id")?;
    let photo = match photo_id {
        Some(blob) => Some(PhotoRef {
            uuid: blob_to_uuid(&blob)?,
            name: row.try_get::<Option<String>, _>("photo_name")?.unwrap_or_default(),
        }),
        None => None,
    };
    Ok(Post {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        seq: row.try_get("seq")?,
        board_id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("board_id")?)?,
        name: row.try_get("name")?,
        message: row.try_get("message")?,
        photo,
        created_at: micros_to_time(row.try_get("created_at")?)?,
    })
}

#[async_trait]
impl BoardRepo for SqliteStore {
    async fn create_board(&self, board: &Board) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO boards (id, title, description, background, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(board.id))
        .bind(&board.title)
        .bind(&board.description)
        .bind(board.background.map(uuid_to_blob))
        .bind(board.created_at.timestamp_micros())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_board(&self, id: Uuid) -> anyhow::Result<Option<Board>> {
        let row = sqlx::query(
            "SELECT id, title, description, background, created_at FROM boards WHERE id = ?",
        )
        .bind(uuid_to_blob(id))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_board).transpose()
    }

    async fn list_boards(&self) -> anyhow::Result<Vec<Board>> {
        let rows = sqlx::query(
            "SELECT id, title, description, background, created_at FROM boards ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_board).collect()
    }

    /// Posts go with the board through `ON DELETE CASCADE`; images are untouched.
    async fn delete_board(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM boards WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PostRepo for SqliteStore {
    /// One statement assigns `seq` and `created_at`, so concurrent inserts
    /// cannot interleave. `created_at` never falls behind the newest post on
    /// the board, keeping the order stable if the wall clock steps back.
    async fn insert_post(&self, post: NewPost) -> anyhow::Result<Post> {
        let now = Utc::now().timestamp_micros();
        let row = sqlx::query(
            "INSERT INTO posts (id, board_id, name, message, photo_id, photo_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6,
                     MAX(?7, COALESCE((SELECT MAX(created_at) FROM posts WHERE board_id = ?2), ?7)))
             RETURNING seq, created_at",
        )
        .bind(uuid_to_blob(post.id))
        .bind(uuid_to_blob(post.board_id))
        .bind(&post.name)
        .bind(&post.message)
        .bind(post.photo.as_ref().map(|p| uuid_to_blob(p.uuid)))
        .bind(post.photo.as_ref().map(|p| p.name.clone()))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(Post {
            id: post.id,
            seq: row.try_get("seq")?,
            board_id: post.board_id,
            name: post.name,
            message: post.message,
            photo: post.photo,
            created_at: micros_to_time(row.try_get("created_at")?)?,
        })
    }

    async fn list_posts(&self, board_id: Uuid, offset: u64, limit: u64) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT seq, id, board_id, name, message, photo_id, photo_name, created_at
             FROM posts WHERE board_id = ?
             ORDER BY created_at DESC, seq DESC
             LIMIT ? OFFSET ?",
        )
        .bind(uuid_to_blob(board_id))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_post).collect()
    }
}

#[async_trait]
impl ImageStore for SqliteStore {
    async fn put_image(&self, image: &Image) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO images (id, name, data, created_at) VALUES (?, ?, ?, ?)")
            .bind(uuid_to_blob(image.id))
            .bind(&image.name)
            .bind(image.data.as_ref())
            .bind(Utc::now().timestamp_micros())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_image(&self, id: Uuid) -> anyhow::Result<Option<Image>> {
        let row = sqlx::query("SELECT id, name, data FROM images WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Image {
                id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
                name: row.try_get("name")?,
                data: Bytes::from(row.try_get::<Vec<u8>, _>("data")?),
            })),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    // Storage keeps microseconds; compare against values it can represent.
    fn now() -> DateTime<Utc> {
        micros_to_time(Utc::now().timestamp_micros()).unwrap()
    }

    async fn board(store: &SqliteStore, title: &str) -> Board {
        let board = Board {
            id: Uuid::now_v7(),
            title: title.into(),
            description: "bar".into(),
            background: None,
            created_at: now(),
        };
        store.create_board(&board).await.unwrap();
        board
    }

    async fn post(store: &SqliteStore, board_id: Uuid, message: &str) -> Post {
        store
            .insert_post(NewPost {
                id: Uuid::now_v7(),
                board_id,
                name: String::new(),
                message: message.into(),
                photo: None,
            })
            .await
            .unwrap()
    }

    fn messages(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.message.as_str()).collect()
    }

    #[tokio::test]
    async fn pages_are_newest_first_and_short_at_the_end() {
        let store = store().await;
        let b = board(&store, "foo").await;
        for i in 0..5 {
            post(&store, b.id, &format!("t{i}")).await;
        }

        let all = store.list_posts(b.id, 0, 10).await.unwrap();
        assert_eq!(messages(&all), ["t4", "t3", "t2", "t1", "t0"]);

        assert!(store.list_posts(b.id, 5, 10).await.unwrap().is_empty());

        let tail = store.list_posts(b.id, 3, 10).await.unwrap();
        assert_eq!(messages(&tail), ["t1", "t0"]);
    }

    #[tokio::test]
    async fn consecutive_pages_cover_everything_once() {
        let store = store().await;
        let b = board(&store, "foo").await;
        for i in 0..7 {
            post(&store, b.id, &format!("m{i}")).await;
        }

        let full = store.list_posts(b.id, 0, 100).await.unwrap();
        let mut stitched = Vec::new();
        for start in (0..9).step_by(3) {
            stitched.extend(store.list_posts(b.id, start, 3).await.unwrap());
        }
        assert_eq!(stitched, full);
        assert_eq!(store.list_posts(b.id, 2, 4).await.unwrap(), store.list_posts(b.id, 2, 4).await.unwrap());
    }

    #[tokio::test]
    async fn equal_timestamps_fall_back_to_insertion_order() {
        let store = store().await;
        let b = board(&store, "foo").await;
        let stamp = Utc::now().timestamp_micros();
        for message in ["first", "second", "third"] {
            sqlx::query("INSERT INTO posts (id, board_id, message, created_at) VALUES (?, ?, ?, ?)")
                .bind(uuid_to_blob(Uuid::now_v7()))
                .bind(uuid_to_blob(b.id))
                .bind(message)
                .bind(stamp)
                .execute(&store.pool)
                .await
                .unwrap();
        }

        let page = store.list_posts(b.id, 0, 10).await.unwrap();
        assert_eq!(messages(&page), ["third", "second", "first"]);
        assert!(page.windows(2).all(|w| w[0].seq > w[1].seq));
    }

    #[tokio::test]
    async fn insert_never_stamps_behind_the_newest_post() {
        let store = store().await;
        let b = board(&store, "foo").await;
        let future = Utc::now().timestamp_micros() + 60_000_000;
        sqlx::query("INSERT INTO posts (id, board_id, message, created_at) VALUES (?, ?, ?, ?)")
            .bind(uuid_to_blob(Uuid::now_v7()))
            .bind(uuid_to_blob(b.id))
            .bind("from the future")
            .bind(future)
            .execute(&store.pool)
            .await
            .unwrap();

        let latest = post(&store, b.id, "now").await;
        assert_eq!(latest.created_at.timestamp_micros(), future);
        let page = store.list_posts(b.id, 0, 1).await.unwrap();
        assert_eq!(messages(&page), ["now"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_keep_a_total_order() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("board.db").display());
        let store = SqliteStore::new(&url).await.unwrap();
        let board_id = board(&store, "busy").await.id;

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                post(&store, board_id, &format!("c{i}")).await
            }));
        }
        let mut inserted = Vec::new();
        for handle in handles {
            inserted.push(handle.await.unwrap().id);
        }

        let all = store.list_posts(board_id, 0, 100).await.unwrap();
        assert_eq!(all.len(), 50);
        let mut ids: Vec<Uuid> = all.iter().map(|p| p.id).collect();
        ids.sort();
        inserted.sort();
        assert_eq!(ids, inserted);

        // Later inserts never carry an earlier stamp, so both keys descend together.
        for pair in all.windows(2) {
            assert!(pair[0].seq > pair[1].seq);
            assert!(pair[0].created_at >= pair[1].created_at);
        }

        let mut stitched = Vec::new();
        for start in (0..56).step_by(7) {
            stitched.extend(store.list_posts(board_id, start, 7).await.unwrap());
        }
        assert_eq!(stitched, all);
    }

    #[tokio::test]
    async fn posts_stay_on_their_board() {
        let store = store().await;
        let b1 = board(&store, "foo").await;
        let b2 = board(&store, "foo2").await;
        post(&store, b1.id, "p1").await;
        post(&store, b1.id, "p2").await;
        post(&store, b2.id, "p3").await;
        post(&store, b1.id, "p4").await;

        assert_eq!(messages(&store.list_posts(b1.id, 0, 10).await.unwrap()), ["p4", "p2", "p1"]);
        assert_eq!(messages(&store.list_posts(b2.id, 0, 10).await.unwrap()), ["p3"]);
    }

    #[tokio::test]
    async fn photo_reference_round_trips() {
        let store = store().await;
        let b = board(&store, "foo").await;
        let photo = PhotoRef {
            uuid: Uuid::new_v4(),
            name: "cat.png".into(),
        };
        store
            .insert_post(NewPost {
                id: Uuid::now_v7(),
                board_id: b.id,
                name: "author2".into(),
                message: String::new(),
                photo: Some(photo.clone()),
            })
            .await
            .unwrap();

        let page = store.list_posts(b.id, 0, 1).await.unwrap();
        assert_eq!(page[0].photo, Some(photo));
        assert_eq!(page[0].name, "author2");
    }

    #[tokio::test]
    async fn image_bytes_round_trip_with_distinct_ids() {
        let store = store().await;
        let a = Image::new("same.bin", Bytes::from_static(b"\x89PNG\r\n"));
        let b = Image::new("same.bin", Bytes::from_static(b"\x89PNG\r\n"));
        store.put_image(&a).await.unwrap();
        store.put_image(&b).await.unwrap();

        assert_eq!(store.get_image(a.id).await.unwrap(), Some(a.clone()));
        assert_eq!(store.get_image(b.id).await.unwrap(), Some(b));
        assert_eq!(store.get_image(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleting_a_board_cascades_to_posts_but_not_images() {
        let store = store().await;
        let bg = Image::new("bg.png", Bytes::from_static(b"bg"));
        store.put_image(&bg).await.unwrap();
        let b = Board {
            id: Uuid::now_v7(),
            title: "foo".into(),
            description: "bar".into(),
            background: Some(bg.id),
            created_at: now(),
        };
        store.create_board(&b).await.unwrap();
        post(&store, b.id, "doomed").await;

        assert_eq!(store.get_board(b.id).await.unwrap(), Some(b.clone()));
        assert!(store.delete_board(b.id).await.unwrap());
        assert!(!store.delete_board(b.id).await.unwrap());

        assert_eq!(store.get_board(b.id).await.unwrap(), None);
        assert!(store.list_posts(b.id, 0, 10).await.unwrap().is_empty());
        assert!(store.get_image(bg.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn posts_require_an_existing_board() {
        let store = store().await;
        let result = store
            .insert_post(NewPost {
                id: Uuid::now_v7(),
                board_id: Uuid::new_v4(),
                name: String::new(),
                message: "orphan".into(),
                photo: None,
            })
            .await;
        assert!(result.is_err());
    }
}
