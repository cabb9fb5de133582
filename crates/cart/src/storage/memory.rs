//! Process-local snapshot storage.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CartStorage, StorageError};

/// Snapshot storage kept in a map. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-seeded with one snapshot.
    #[must_use]
    pub fn with_snapshot(key: impl Into<String>, snapshot: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.entries.lock().insert(key.into(), snapshot.into());
        storage
    }

    /// Current raw snapshot under `key`.
    #[must_use]
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

#[async_trait]
impl CartStorage for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.snapshot(key))
    }

    async fn save(&self, key: &str, snapshot: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .insert(key.to_string(), snapshot.to_string());
        Ok(())
    }
}
