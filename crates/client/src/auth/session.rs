//! Session manager
//!
//! The token lifecycle: load persisted credentials at startup, answer
//! "is the current access credential usable", run the refresh protocol,
//! and clear everything when the session is over.
//!
//! Concurrency rule: at most one in-flight refresh per process. A caller
//! that observes an in-flight refresh awaits its result instead of
//! issuing a duplicate refresh, so servers that rotate refresh tokens
//! never see two competing rotations.

use std::sync::Arc;

use async_trait::async_trait;
use casebook_domain::{TokenResponse, UserProfile};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::credentials::CredentialPair;
use crate::errors::{ApiError, MSG_AUTH_REQUIRED};
use crate::store::{self, keys, CredentialStore};

/// Network seam for the refresh protocol.
///
/// Implemented over the failover dispatcher in production; tests drop in
/// scripted fakes.
#[async_trait]
pub trait RefreshClient: Send + Sync {
    /// Exchange a refresh token for a new credential pair.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ApiError>;
}

pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn RefreshClient>,
    clock: Arc<dyn Clock>,
    current: RwLock<CredentialPair>,
    refresh_gate: Mutex<()>,
    buffer: Duration,
    fallback_validity: Duration,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn RefreshClient>,
        clock: Arc<dyn Clock>,
        buffer_secs: i64,
        fallback_validity_secs: i64,
    ) -> Self {
        Self {
            store,
            refresher,
            clock,
            current: RwLock::new(CredentialPair::default()),
            refresh_gate: Mutex::new(()),
            buffer: Duration::seconds(buffer_secs),
            fallback_validity: Duration::seconds(fallback_validity_secs),
        }
    }

    /// Load persisted credentials, migrating historical key names first.
    ///
    /// Call once at startup. Returns `true` if a credential pair was
    /// found in the store.
    pub async fn initialize(&self) -> Result<bool, ApiError> {
        store::migrate_legacy_keys(self.store.as_ref()).await?;

        let access_token = self.store.get(keys::ACCESS_TOKEN).await?;
        if access_token.is_none() {
            debug!("no persisted credentials found");
            return Ok(false);
        }

        let refresh_token = self.store.get(keys::REFRESH_TOKEN).await?;
        let token_type = self
            .store
            .get(keys::TOKEN_TYPE)
            .await?
            .unwrap_or_else(|| CredentialPair::default().token_type);
        let expires_at = self
            .store
            .get(keys::EXPIRES_AT)
            .await?
            .and_then(|millis| millis.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis);

        *self.current.write().await =
            CredentialPair { access_token, refresh_token, token_type, expires_at };
        info!("session restored from credential store");
        Ok(true)
    }

    pub async fn current(&self) -> CredentialPair {
        self.current.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_authenticated()
    }

    /// Install a fresh pair after a successful login, signup or refresh,
    /// persisting it alongside the in-memory copy.
    pub async fn install(&self, response: &TokenResponse) -> Result<CredentialPair, ApiError> {
        let pair =
            CredentialPair::from_token_response(response, self.clock.now(), self.fallback_validity);
        self.persist(&pair).await?;
        *self.current.write().await = pair.clone();
        debug!("credential pair installed");
        Ok(pair)
    }

    /// `Authorization` value for an outgoing request, refreshing first if
    /// the pair is inside the expiry buffer.
    ///
    /// `Ok(None)` means the caller is unauthenticated and the request
    /// goes out without a bearer header.
    pub async fn authorization(&self) -> Result<Option<String>, ApiError> {
        let (pair, stale) = {
            let current = self.current.read().await;
            (current.clone(), current.is_expired(self.clock.now(), self.buffer))
        };

        if !pair.is_authenticated() {
            return Ok(None);
        }
        if !stale {
            return Ok(pair.authorization_value());
        }

        let refreshed = self.refresh_if_stale().await?;
        Ok(refreshed.authorization_value())
    }

    /// Refresh unless another caller already did while we waited for the
    /// gate.
    async fn refresh_if_stale(&self) -> Result<CredentialPair, ApiError> {
        let _gate = self.refresh_gate.lock().await;
        {
            let current = self.current.read().await;
            if !current.is_expired(self.clock.now(), self.buffer) {
                debug!("refresh already performed by concurrent caller");
                return Ok(current.clone());
            }
        }
        self.refresh_locked().await
    }

    /// Refresh after the server rejected `stale_access_token`.
    ///
    /// If a concurrent caller already replaced that token, its result is
    /// reused rather than issuing a second refresh.
    pub async fn refresh_after_rejection(
        &self,
        stale_access_token: Option<&str>,
    ) -> Result<CredentialPair, ApiError> {
        let _gate = self.refresh_gate.lock().await;
        {
            let current = self.current.read().await;
            if current.is_authenticated()
                && current.access_token.as_deref() != stale_access_token
            {
                debug!("credential already rotated by concurrent caller");
                return Ok(current.clone());
            }
        }
        self.refresh_locked().await
    }

    /// The refresh protocol proper. Caller must hold the refresh gate.
    ///
    /// On any failure the stored credentials are cleared: an unusable
    /// refresh token cannot be recovered client-side.
    async fn refresh_locked(&self) -> Result<CredentialPair, ApiError> {
        let refresh_token = self.current.read().await.refresh_token.clone();
        let Some(refresh_token) = refresh_token else {
            self.clear().await?;
            return Err(ApiError::AuthRequired(MSG_AUTH_REQUIRED.to_string()));
        };

        match self.refresher.refresh(&refresh_token).await {
            Ok(response) => {
                let pair = self.install(&response).await?;
                info!("access credential refreshed");
                Ok(pair)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed; clearing session");
                self.clear().await?;
                Err(ApiError::AuthRequired(MSG_AUTH_REQUIRED.to_string()))
            }
        }
    }

    /// Cache the user profile alongside the credentials.
    pub async fn cache_profile(&self, profile: &UserProfile) -> Result<(), ApiError> {
        let json = serde_json::to_string(profile)
            .map_err(|e| ApiError::Storage(format!("profile encode: {e}")))?;
        self.store.put(keys::USER_PROFILE, &json).await
    }

    pub async fn cached_profile(&self) -> Result<Option<UserProfile>, ApiError> {
        match self.store.get(keys::USER_PROFILE).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| ApiError::Storage(format!("profile decode: {e}"))),
            None => Ok(None),
        }
    }

    /// Null every field of the in-memory pair and remove every persisted
    /// entry, including historical key aliases.
    pub async fn clear(&self) -> Result<(), ApiError> {
        store::clear_all(self.store.as_ref()).await?;
        *self.current.write().await = CredentialPair::default();
        info!("session cleared");
        Ok(())
    }

    async fn persist(&self, pair: &CredentialPair) -> Result<(), ApiError> {
        match &pair.access_token {
            Some(token) => self.store.put(keys::ACCESS_TOKEN, token).await?,
            None => self.store.delete(keys::ACCESS_TOKEN).await?,
        }
        match &pair.refresh_token {
            Some(token) => self.store.put(keys::REFRESH_TOKEN, token).await?,
            None => self.store.delete(keys::REFRESH_TOKEN).await?,
        }
        self.store.put(keys::TOKEN_TYPE, &pair.token_type).await?;
        match pair.expires_at {
            Some(at) => {
                self.store.put(keys::EXPIRES_AT, &at.timestamp_millis().to_string()).await?
            }
            None => self.store.delete(keys::EXPIRES_AT).await?,
        }
        Ok(())
    }
}
