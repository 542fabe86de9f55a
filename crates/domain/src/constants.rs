//! Application constants
//!
//! Centralized location for domain-level constants used by the client.

// Dispatch configuration
pub const DEFAULT_PRIMARY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_FALLBACK_TIMEOUT_SECS: u64 = 5;

// Credential lifecycle
pub const DEFAULT_REFRESH_BUFFER_SECS: i64 = 60;
/// Client-side validity assumed for refreshed tokens when the server does
/// not return an explicit TTL.
pub const DEFAULT_REFRESH_VALIDITY_SECS: i64 = 30 * 60;
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

// Required request headers
/// Pass-through header for intermediary tunnel infrastructure. Constant
/// value, never interpreted by the client.
pub const TUNNEL_BYPASS_HEADER: &str = "ngrok-skip-browser-warning";
pub const TUNNEL_BYPASS_VALUE: &str = "true";

// Credential store
pub const DEFAULT_CREDENTIAL_SERVICE: &str = "casebook.session";
