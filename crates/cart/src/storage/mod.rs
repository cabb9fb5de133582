//! Durable storage for cart snapshots.
//!
//! Storage is opaque string storage addressed by a namespace key, with
//! last-write-wins semantics and no transactions. The cart store serializes
//! the cart itself (see [`crate::snapshot`]); adapters never look inside.
//!
//! # Adapters
//!
//! - [`MemoryStorage`] - process-local map
//! - [`FileStorage`] - one file per key under a directory
//! - `PgStorage` - `cart_snapshots` table (requires the `postgres` feature)

mod file;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use file::FileStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "postgres")]
pub use postgres::PgStorage;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};
use crate::snapshot::SnapshotError;

/// Errors that can occur reading or writing snapshots.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cart could not be serialized.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Database operation failed.
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Running migrations failed.
    #[cfg(feature = "postgres")]
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The adapter is misconfigured or refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Persistence adapter for serialized carts.
#[async_trait]
pub trait CartStorage: Send + Sync {
    /// Read the snapshot stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the snapshot stored under `key`.
    async fn save(&self, key: &str, snapshot: &str) -> Result<(), StorageError>;
}

/// Open the storage adapter selected by configuration.
///
/// # Errors
///
/// Returns `StorageError` if the backend cannot be reached, or
/// `StorageError::Unavailable` if `postgres` is selected without the feature.
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn CartStorage>, StorageError> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
        StorageBackend::File => Ok(Arc::new(FileStorage::new(&config.dir))),
        StorageBackend::Postgres => open_postgres(config).await,
    }
}

#[cfg(feature = "postgres")]
async fn open_postgres(config: &StorageConfig) -> Result<Arc<dyn CartStorage>, StorageError> {
    let url = config.database_url.as_ref().ok_or_else(|| {
        StorageError::Unavailable("postgres storage requires CART_DATABASE_URL".to_string())
    })?;
    Ok(Arc::new(PgStorage::connect(url).await?))
}

#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
async fn open_postgres(_config: &StorageConfig) -> Result<Arc<dyn CartStorage>, StorageError> {
    Err(StorageError::Unavailable(
        "postgres storage requires the `postgres` feature".to_string(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_memory_backend() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..StorageConfig::default()
        };
        let storage = open(&config).await.unwrap();
        storage.save("k", "[]").await.unwrap();
        assert_eq!(storage.load("k").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_open_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::File,
            dir: dir.path().to_path_buf(),
            ..StorageConfig::default()
        };
        let storage = open(&config).await.unwrap();
        assert!(storage.load("missing").await.unwrap().is_none());
    }

    #[cfg(not(feature = "postgres"))]
    #[tokio::test]
    async fn test_open_postgres_without_feature() {
        let config = StorageConfig {
            backend: StorageBackend::Postgres,
            ..StorageConfig::default()
        };
        assert!(matches!(
            open(&config).await,
            Err(StorageError::Unavailable(_))
        ));
    }
}
