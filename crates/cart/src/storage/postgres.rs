//! `PostgreSQL` snapshot storage.
//!
//! # Table: `cart_snapshots`
//!
//! | Column | Type | Notes |
//! |--------|------|-------|
//! | `storage_key` | `TEXT` | primary key (namespace key) |
//! | `snapshot` | `TEXT` | serialized cart |
//! | `updated_at` | `TIMESTAMPTZ` | last write |
//!
//! Migrations live in `crates/cart/migrations/` and are applied with
//! `rs-cart migrate`.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use super::{CartStorage, StorageError};

/// Snapshot storage in a `PostgreSQL` table.
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a small pool; a cart has a single writer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Database` if the connection cannot be established.
    pub async fn connect(database_url: &SecretString) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url.expose_secret())
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply pending migrations.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Migration` if a migration fails.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        info!("Running cart storage migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Cart storage migrations complete");
        Ok(())
    }
}

#[async_trait]
impl CartStorage for PgStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let snapshot = sqlx::query_scalar::<_, String>(
            "SELECT snapshot FROM cart_snapshots WHERE storage_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(snapshot)
    }

    async fn save(&self, key: &str, snapshot: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO cart_snapshots (storage_key, snapshot, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (storage_key)
            DO UPDATE SET snapshot = EXCLUDED.snapshot, updated_at = now()
            ",
        )
        .bind(key)
        .bind(snapshot)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
