//! Platform-keychain credential store
//!
//! Persists each schema key as its own keychain entry under a single
//! service name. The keyring API is blocking, so every call is moved onto
//! the blocking pool.

use async_trait::async_trait;
use keyring::Entry;
use tracing::debug;

use super::CredentialStore;
use crate::errors::ApiError;

#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self { service: service.into() }
    }

    fn entry(&self, key: &str) -> Result<Entry, ApiError> {
        Entry::new(&self.service, key)
            .map_err(|e| ApiError::Storage(format!("keychain entry {key}: {e}")))
    }
}

#[async_trait]
impl CredentialStore for KeyringStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        let entry = self.entry(key)?;
        let key = key.to_string();
        tokio::task::spawn_blocking(move || match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(ApiError::Storage(format!("keychain read {key}: {e}"))),
        })
        .await
        .map_err(|e| ApiError::Storage(format!("keychain task: {e}")))?
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), ApiError> {
        debug!(key, "storing credential entry");
        let entry = self.entry(key)?;
        let key = key.to_string();
        let value = value.to_string();
        tokio::task::spawn_blocking(move || {
            entry
                .set_password(&value)
                .map_err(|e| ApiError::Storage(format!("keychain write {key}: {e}")))
        })
        .await
        .map_err(|e| ApiError::Storage(format!("keychain task: {e}")))?
    }

    async fn delete(&self, key: &str) -> Result<(), ApiError> {
        let entry = self.entry(key)?;
        let key = key.to_string();
        tokio::task::spawn_blocking(move || match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(ApiError::Storage(format!("keychain delete {key}: {e}"))),
        })
        .await
        .map_err(|e| ApiError::Storage(format!("keychain task: {e}")))?
    }
}
