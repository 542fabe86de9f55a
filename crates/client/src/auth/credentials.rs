//! Access/refresh credential pair with expiry bookkeeping

use casebook_domain::constants::DEFAULT_TOKEN_TYPE;
use casebook_domain::TokenResponse;
use chrono::{DateTime, Duration, Utc};

/// The current access/refresh credential pair.
///
/// Mutated only by login, signup, refresh and clear. A pair with no
/// access token, or no recorded expiry, is always treated as expired -
/// never trust a token without an expiry record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Default for CredentialPair {
    fn default() -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            expires_at: None,
        }
    }
}

impl CredentialPair {
    /// Build a pair from a token endpoint response.
    ///
    /// The server-declared TTL is authoritative; `fallback_validity` is
    /// only used when the response carries no `expires_in`.
    pub fn from_token_response(
        response: &TokenResponse,
        now: DateTime<Utc>,
        fallback_validity: Duration,
    ) -> Self {
        let validity = response.expires_in.map_or(fallback_validity, Duration::seconds);
        let token_type = if response.token_type.eq_ignore_ascii_case("bearer") {
            DEFAULT_TOKEN_TYPE.to_string()
        } else {
            response.token_type.clone()
        };
        Self {
            access_token: Some(response.access_token.clone()),
            refresh_token: response.refresh_token.clone(),
            token_type,
            expires_at: Some(now + validity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Whether the access credential is unusable at `now`, renewing
    /// `buffer` ahead of the recorded deadline so a request never flies
    /// with a token that expires mid-flight.
    pub fn is_expired(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        if self.access_token.is_none() {
            return true;
        }
        match self.expires_at {
            Some(expires_at) => now + buffer >= expires_at,
            None => true,
        }
    }

    /// `Authorization` header value for this pair, when usable.
    pub fn authorization_value(&self) -> Option<String> {
        self.access_token.as_ref().map(|token| format!("{} {token}", self.token_type))
    }
}
