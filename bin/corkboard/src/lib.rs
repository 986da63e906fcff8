//! # corkboard
//!
//! Assembles `BoardService` from the backends compiled in by cargo features.
//! Shared by the server and the `seed` tool.

pub mod settings;

use std::sync::Arc;

use cb_core::{BoardService, ImageStore};

#[cfg(feature = "db-sqlite")]
use cb_db_sqlite::SqliteStore;

#[cfg(feature = "storage-local")]
use cb_storage_local::LocalImageStore;

use settings::{ImageBackend, Settings};

#[cfg(not(feature = "db-sqlite"))]
compile_error!("corkboard needs a database backend: enable the `db-sqlite` feature");

pub async fn build_service(settings: &Settings) -> anyhow::Result<BoardService> {
    // 1. Initialize Database Implementation
    let store = Arc::new(SqliteStore::new(&settings.database_url).await?);

    // 2. Initialize Image Storage Implementation
    let images: Arc<dyn ImageStore> = match settings.image_backend {
        ImageBackend::Database => store.clone(),
        #[cfg(feature = "storage-local")]
        ImageBackend::Filesystem => Arc::new(LocalImageStore::new(&settings.upload_dir)),
        #[cfg(not(feature = "storage-local"))]
        ImageBackend::Filesystem => {
            anyhow::bail!("image_backend = \"filesystem\" needs the `storage-local` feature")
        }
    };
    log::info!("image backend: {:?}", settings.image_backend);

    Ok(BoardService::new(store.clone(), store, images))
}
