//! Client configuration structures
//!
//! The registry of candidate servers and the dispatch/credential tuning
//! knobs. Loaded once at startup; immutable afterwards.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CREDENTIAL_SERVICE, DEFAULT_FALLBACK_TIMEOUT_SECS, DEFAULT_PRIMARY_TIMEOUT_SECS,
    DEFAULT_REFRESH_BUFFER_SECS, DEFAULT_REFRESH_VALIDITY_SECS,
};

/// A registered candidate server.
///
/// Registry order defines failover priority; `id` must be unique within a
/// registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    pub id: String,
    pub display_name: String,
    pub base_address: String,
}

impl ServerDescriptor {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        base_address: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            base_address: base_address.into(),
        }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Primary servers, tried in order.
    pub servers: Vec<ServerDescriptor>,
    /// Lower-trust fallback addresses, tried only after every primary
    /// server fails.
    pub fallback_addresses: Vec<String>,
    /// Per-attempt timeout for primary servers, in seconds.
    pub primary_timeout_secs: u64,
    /// Per-attempt timeout for fallback addresses, in seconds.
    pub fallback_timeout_secs: u64,
    /// Seconds before the recorded expiry at which a token counts as stale.
    pub refresh_buffer_secs: i64,
    /// Assumed validity of a refreshed token when the server returns no TTL.
    pub refresh_validity_secs: i64,
    /// Service name for the persisted credential store.
    pub credential_service: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            servers: vec![
                ServerDescriptor::new(
                    "primary",
                    "Casebook API",
                    "https://api.casebook-research.com",
                ),
                ServerDescriptor::new(
                    "mirror",
                    "Casebook API (mirror)",
                    "https://api-mirror.casebook-research.com",
                ),
            ],
            fallback_addresses: vec!["https://casebook-api.eu.ngrok.io".to_string()],
            primary_timeout_secs: DEFAULT_PRIMARY_TIMEOUT_SECS,
            fallback_timeout_secs: DEFAULT_FALLBACK_TIMEOUT_SECS,
            refresh_buffer_secs: DEFAULT_REFRESH_BUFFER_SECS,
            refresh_validity_secs: DEFAULT_REFRESH_VALIDITY_SECS,
            credential_service: DEFAULT_CREDENTIAL_SERVICE.to_string(),
        }
    }
}
