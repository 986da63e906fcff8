//! # cb-storage-local
//! corkboard/crates/cb-plugins/cb-storage-local/src/lib.rs
//! Local filesystem implementation of `ImageStore`.
//! Files are sharded by identity; the original filename sits beside the payload.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use cb_core::models::Image;
use cb_core::traits::ImageStore;
use tokio::fs;
use uuid::Uuid;

pub struct LocalImageStore {
    /// Root directory for all images (e.g., "./data/images")
    root_path: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root.into(),
        }
    }

    /// Generates a sharded path: "ab/cd/abcd...uuid"
    fn get_sharded_path(&self, id: Uuid) -> PathBuf {
        let simple = id.simple().to_string();
        let mut path = self.root_path.clone();
        path.push(&simple[0..2]);
        path.push(&simple[2..4]);
        path.push(&simple);
        path
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    /// The payload is written under a temporary name and renamed into place,
    /// so a reader never sees a partially written image.
    async fn put_image(&self, image: &Image) -> anyhow::Result<()> {
        let target_path = self.get_sharded_path(image.id);
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(target_path.with_extension("name"), image.name.as_bytes()).await?;

        let partial = target_path.with_extension("partial");
        fs::write(&partial, &image.data).await?;
        fs::rename(&partial, &target_path).await?;

        log::debug!("image {} written to {}", image.id, target_path.display());
        Ok(())
    }

    async fn get_image(&self, id: Uuid) -> anyhow::Result<Option<Image>> {
        let target_path = self.get_sharded_path(id);
        let data = match fs::read(&target_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let name = match fs::read_to_string(target_path.with_extension("name")).await {
            Ok(name) => name,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(Image {
            id,
            name,
            data: Bytes::from(data),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_bytes_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path());
        let image = Image::new("sunset.jpg", Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0x00, 0x01]));

        store.put_image(&image).await.unwrap();
        assert_eq!(store.get_image(image.id).await.unwrap(), Some(image.clone()));

        let simple = image.id.simple().to_string();
        let on_disk = dir.path().join(&simple[0..2]).join(&simple[2..4]).join(&simple);
        assert!(on_disk.exists());
        assert!(!on_disk.with_extension("partial").exists());
    }

    #[tokio::test]
    async fn identical_payloads_are_stored_separately() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path());
        let a = Image::new("a.png", Bytes::from_static(b"same"));
        let b = Image::new("a.png", Bytes::from_static(b"same"));

        store.put_image(&a).await.unwrap();
        store.put_image(&b).await.unwrap();

        assert_eq!(store.get_image(a.id).await.unwrap().unwrap().id, a.id);
        assert_eq!(store.get_image(b.id).await.unwrap().unwrap().id, b.id);
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path());
        assert!(store.get_image(Uuid::new_v4()).await.unwrap().is_none());
    }
}
