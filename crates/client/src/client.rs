//! API client facade
//!
//! Wires configuration, registry, dispatcher and session manager
//! together, and drives the one-shot 401 -> refresh -> retry sequence.
//! Constructed explicitly with injected collaborators so tests can
//! substitute a fake store and clock instead of touching real state.

use std::sync::Arc;

use async_trait::async_trait;
use casebook_domain::{ClientConfig, TokenResponse};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::auth::{Clock, RefreshClient, SessionManager, SystemClock};
use crate::dispatch::{EndpointClass, FailoverDispatcher, RawResponse, RequestBody};
use crate::errors::{ApiError, MSG_AUTH_REQUIRED, MSG_SESSION_EXPIRED};
use crate::normalize;
use crate::ops::OperationDef;
use crate::registry::ServerRegistry;
use crate::store::{CredentialStore, KeyringStore};
use crate::{ops, ActiveServer};

/// Runs the refresh protocol over the failover dispatcher.
///
/// Refresh goes through the same dispatch path as everything else, so it
/// inherits failover and the auth-class no-retry policy.
struct DispatchRefresher {
    dispatcher: Arc<FailoverDispatcher>,
}

#[async_trait]
impl RefreshClient for DispatchRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ApiError> {
        let spec = ops::REFRESH.spec(&[])?.json(json!({ "refresh_token": refresh_token }));
        let raw = self.dispatcher.dispatch(&spec).await?;
        normalize::into_result(raw)?.json()
    }
}

/// The data-access client. One instance per process is expected, shared
/// behind an `Arc`.
pub struct ApiClient {
    dispatcher: Arc<FailoverDispatcher>,
    session: Arc<SessionManager>,
}

impl ApiClient {
    /// Create a client with the default persisted store and system clock.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Load persisted credentials. Call once at startup.
    pub async fn initialize(&self) -> Result<bool, ApiError> {
        self.session.initialize().await
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// The endpoint that served the last successful dispatch.
    pub async fn active_server(&self) -> Option<ActiveServer> {
        self.dispatcher.active_server().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    /// Execute a catalog operation and deserialize its JSON payload.
    pub(crate) async fn invoke<T: DeserializeOwned>(
        &self,
        op: &OperationDef,
        args: &[(&str, &str)],
        body: RequestBody,
        cancel: Option<CancellationToken>,
    ) -> Result<T, ApiError> {
        let response = self.invoke_raw(op, args, body, None, cancel).await?;
        decode(op, &response)
    }

    /// Execute a catalog operation and return the body as text, for
    /// content-negotiated non-JSON representations.
    pub(crate) async fn invoke_text(
        &self,
        op: &OperationDef,
        args: &[(&str, &str)],
        accept: &str,
    ) -> Result<String, ApiError> {
        let response =
            self.invoke_raw(op, args, RequestBody::Empty, Some(accept), None).await?;
        Ok(response.text())
    }

    /// Dispatch with the one-shot 401 recovery.
    ///
    /// Invariant: the retry-after-refresh path never recurses. A second
    /// 401 after a successful refresh surfaces as `SessionExpired`.
    pub(crate) async fn invoke_raw(
        &self,
        op: &OperationDef,
        args: &[(&str, &str)],
        body: RequestBody,
        accept: Option<&str>,
        cancel: Option<CancellationToken>,
    ) -> Result<RawResponse, ApiError> {
        let mut spec = op.spec(args)?;
        spec.body = body;
        spec.cancel = cancel;
        if let Some(accept) = accept {
            spec = spec.header("Accept", accept);
        }

        let sent_authorization = match op.class {
            EndpointClass::Auth => None,
            EndpointClass::Generic => self.session.authorization().await?,
        };
        if let Some(value) = &sent_authorization {
            spec = spec.header("Authorization", value.clone());
        }

        let response = self.dispatcher.dispatch(&spec).await?;
        if response.status != StatusCode::UNAUTHORIZED || op.class == EndpointClass::Auth {
            return normalize::into_result(response);
        }

        debug!(operation = op.name, "access credential rejected; attempting refresh");
        if self.session.current().await.refresh_token.is_none() {
            self.session.clear().await?;
            return Err(ApiError::AuthRequired(MSG_AUTH_REQUIRED.to_string()));
        }

        let stale_token = sent_authorization
            .as_deref()
            .and_then(|value| value.split_once(' '))
            .map(|(_, token)| token.to_string());
        let pair = match self.session.refresh_after_rejection(stale_token.as_deref()).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(operation = op.name, error = %e, "refresh after rejection failed");
                return Err(ApiError::SessionExpired(MSG_SESSION_EXPIRED.to_string()));
            }
        };

        let mut retry = spec.clone();
        retry.headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
        if let Some(value) = pair.authorization_value() {
            retry = retry.header("Authorization", value);
        }

        let retried = self.dispatcher.dispatch(&retry).await?;
        if retried.status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::SessionExpired(MSG_SESSION_EXPIRED.to_string()));
        }
        normalize::into_result(retried)
    }
}

fn decode<T: DeserializeOwned>(op: &OperationDef, response: &RawResponse) -> Result<T, ApiError> {
    // 204/205 and genuinely empty bodies deserialize from null, so unit
    // responses work without a special return type.
    if response.status == StatusCode::NO_CONTENT
        || response.status == StatusCode::RESET_CONTENT
        || response.body.is_empty()
    {
        return serde_json::from_value(serde_json::Value::Null).map_err(|_| ApiError::Unknown {
            message: format!("empty response body for operation {}", op.name),
            status: Some(response.status.as_u16()),
        });
    }
    response.json()
}

/// Builder for [`ApiClient`].
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    store: Option<Arc<dyn CredentialStore>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ApiClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Substitute the persisted credential store (tests, ephemeral
    /// sessions).
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the registry or HTTP client cannot
    /// be constructed from the configuration.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let registry = ServerRegistry::from_config(&config)?;
        let dispatcher = Arc::new(FailoverDispatcher::new(registry, &config)?);

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(KeyringStore::new(config.credential_service.clone())));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let refresher = Arc::new(DispatchRefresher { dispatcher: dispatcher.clone() });
        let session = Arc::new(SessionManager::new(
            store,
            refresher,
            clock,
            config.refresh_buffer_secs,
            config.refresh_validity_secs,
        ));

        Ok(ApiClient { dispatcher, session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn builder_defaults_produce_a_client() {
        let client = ApiClient::builder()
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap();
        assert!(!client.is_authenticated().await);
        assert!(client.active_server().await.is_none());
    }

    #[test]
    fn builder_rejects_bad_registry() {
        let config = ClientConfig { servers: vec![], ..ClientConfig::default() };
        let result = ApiClient::builder().config(config).build();
        assert!(matches!(result, Err(ApiError::Config(_))));
    }
}
