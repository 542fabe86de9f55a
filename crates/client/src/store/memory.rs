//! In-memory credential store
//!
//! Used by tests and by ephemeral sessions that should not persist
//! credentials across restarts.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CredentialStore;
use crate::errors::ApiError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), ApiError> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ApiError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_values() {
        let store = MemoryStore::new();
        assert!(store.get("k").await.unwrap().is_none());

        store.put("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        store.delete("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());

        // Deleting an absent key is fine
        store.delete("k").await.unwrap();
    }
}
