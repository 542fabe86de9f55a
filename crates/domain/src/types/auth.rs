//! Authentication payload types

use serde::{Deserialize, Serialize};

/// Credentials submitted to the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload for account creation.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Token response from the login, signup and refresh endpoints.
///
/// `expires_in` is optional: not every deployment reports a TTL, in which
/// case the client falls back to its configured validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

fn default_token_type() -> String {
    crate::constants::DEFAULT_TOKEN_TYPE.to_string()
}

/// User profile cached alongside the credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}
