//! Persisted credential store
//!
//! A small key-value adapter over whatever secret storage the host
//! provides. The session manager is the only writer; everything under the
//! schema below is removed together on logout.

mod keyring;
mod memory;

use async_trait::async_trait;
use tracing::debug;

pub use self::keyring::KeyringStore;
pub use self::memory::MemoryStore;
use crate::errors::ApiError;

/// Canonical key schema plus the historical aliases earlier releases
/// wrote. Aliases are migrated once at startup, not checked on every read.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const TOKEN_TYPE: &str = "token_type";
    pub const EXPIRES_AT: &str = "expires_at";
    pub const USER_PROFILE: &str = "user_profile";

    /// All canonical keys, in the order they are cleared.
    pub const ALL: &[&str] = &[ACCESS_TOKEN, REFRESH_TOKEN, TOKEN_TYPE, EXPIRES_AT, USER_PROFILE];

    /// Historical names a canonical key may have been written under.
    pub fn aliases(key: &str) -> &'static [&'static str] {
        match key {
            ACCESS_TOKEN => &["accessToken", "auth_token"],
            REFRESH_TOKEN => &["refreshToken"],
            TOKEN_TYPE => &["tokenType"],
            EXPIRES_AT => &["expiresAt", "token_expiry"],
            USER_PROFILE => &["userProfile", "profile"],
            _ => &[],
        }
    }
}

/// String key-value storage for credential material.
///
/// Implementations must be safe to share across tasks; the session
/// manager serializes writes itself.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, ApiError>;

    async fn put(&self, key: &str, value: &str) -> Result<(), ApiError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), ApiError>;
}

/// Move values stored under historical key names to their canonical keys.
///
/// Runs once at startup. A canonical value always wins over an alias; the
/// alias entry is deleted either way so the store never retains stale
/// credentials under alternate names.
pub async fn migrate_legacy_keys(store: &dyn CredentialStore) -> Result<(), ApiError> {
    for &canonical in keys::ALL {
        for &alias in keys::aliases(canonical) {
            let Some(value) = store.get(alias).await? else {
                continue;
            };
            if store.get(canonical).await?.is_none() {
                debug!(alias, canonical, "migrating legacy credential key");
                store.put(canonical, &value).await?;
            }
            store.delete(alias).await?;
        }
    }
    Ok(())
}

/// Delete every canonical key and every alias.
pub async fn clear_all(store: &dyn CredentialStore) -> Result<(), ApiError> {
    for &canonical in keys::ALL {
        store.delete(canonical).await?;
        for &alias in keys::aliases(canonical) {
            store.delete(alias).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrates_alias_into_canonical_key() {
        let store = MemoryStore::new();
        store.put("accessToken", "legacy-token").await.unwrap();

        migrate_legacy_keys(&store).await.unwrap();

        assert_eq!(
            store.get(keys::ACCESS_TOKEN).await.unwrap().as_deref(),
            Some("legacy-token")
        );
        assert!(store.get("accessToken").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn canonical_value_wins_over_alias() {
        let store = MemoryStore::new();
        store.put(keys::REFRESH_TOKEN, "current").await.unwrap();
        store.put("refreshToken", "stale").await.unwrap();

        migrate_legacy_keys(&store).await.unwrap();

        assert_eq!(store.get(keys::REFRESH_TOKEN).await.unwrap().as_deref(), Some("current"));
        assert!(store.get("refreshToken").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_all_removes_aliases_too() {
        let store = MemoryStore::new();
        store.put(keys::ACCESS_TOKEN, "a").await.unwrap();
        store.put("auth_token", "old-a").await.unwrap();
        store.put("token_expiry", "12345").await.unwrap();

        clear_all(&store).await.unwrap();

        assert!(store.get(keys::ACCESS_TOKEN).await.unwrap().is_none());
        assert!(store.get("auth_token").await.unwrap().is_none());
        assert!(store.get("token_expiry").await.unwrap().is_none());
    }
}
