//! Shared fixtures for the integration suites.
//!
//! Every test talks to WireMock servers through a client built on the
//! in-memory credential store, so no test touches the OS keyring.

// Each suite includes this file; not every suite uses every helper.
#![allow(dead_code)]

use std::sync::{Arc, Once};

use casebook_client::{ApiClient, MemoryStore};
use casebook_domain::{ClientConfig, ServerDescriptor, TokenResponse};
use wiremock::MockServer;

static INIT_TRACING: Once = Once::new();

/// Install a fmt subscriber once per test binary, honoring `RUST_LOG`.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Build a client whose registry points at the given mock servers.
///
/// Primaries are named `srv0`, `srv1`, ... in registry order. Timeouts
/// are shortened so unreachable-server tests stay fast.
pub fn client_for(
    primaries: &[&MockServer],
    fallbacks: &[String],
) -> (ApiClient, Arc<MemoryStore>) {
    let addresses: Vec<String> = primaries.iter().map(|server| server.uri()).collect();
    client_for_addresses(&addresses, fallbacks)
}

/// Like [`client_for`], for raw addresses (unreachable-endpoint tests).
pub fn client_for_addresses(
    primaries: &[String],
    fallbacks: &[String],
) -> (ApiClient, Arc<MemoryStore>) {
    init_tracing();
    let servers = primaries
        .iter()
        .enumerate()
        .map(|(i, address)| {
            ServerDescriptor::new(format!("srv{i}"), format!("Server {i}"), address)
        })
        .collect();
    let config = ClientConfig {
        servers,
        fallback_addresses: fallbacks.to_vec(),
        primary_timeout_secs: 3,
        fallback_timeout_secs: 3,
        ..ClientConfig::default()
    };
    let store = Arc::new(MemoryStore::new());
    let client =
        ApiClient::builder().config(config).store(store.clone()).build().expect("client builds");
    (client, store)
}

/// Install a session directly, bypassing the login endpoint.
pub async fn seed_session(client: &ApiClient, access: &str, refresh: Option<&str>) {
    let response = TokenResponse {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        token_type: "Bearer".to_string(),
        expires_in: Some(3600),
    };
    client.session().install(&response).await.expect("session installs");
}

pub fn token_json(access: &str, refresh: &str) -> serde_json::Value {
    serde_json::json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "Bearer",
        "expires_in": 3600,
    })
}

pub fn documents_json() -> serde_json::Value {
    serde_json::json!([
        { "id": "doc-1", "title": "Smith v. Jones", "doc_type": "opinion" },
        { "id": "doc-2", "title": "Lease agreement" },
    ])
}
