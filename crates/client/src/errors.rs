//! Normalized client errors
//!
//! Every failure a caller can observe is one of these variants; raw
//! transport errors never escape the client.

use thiserror::Error;

/// Message for the no-usable-credential outcome. UI callers match on it.
pub const MSG_AUTH_REQUIRED: &str = "Authentication required. Please login.";
/// Message for the refresh-attempted-and-failed outcome.
pub const MSG_SESSION_EXPIRED: &str = "Session expired. Please login again.";

/// Classification of a normalized error, mirroring how UI callers react
/// to it (redirect to login, retry prompt, inline message).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response obtained from any endpoint
    Network,
    /// No usable credential, or the server says we are not authenticated
    AuthRequired,
    /// A refresh was attempted and failed
    SessionExpired,
    /// 4xx with field-level problems
    Validation,
    NotFound,
    /// 5xx
    ServerFault,
    /// The caller's own cancellation aborted the dispatch
    Cancelled,
    Unknown,
    /// Invalid client configuration - never caused by a server
    Config,
    /// Persisted credential store failure
    Storage,
}

/// Client operation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    AuthRequired(String),

    #[error("{0}")]
    SessionExpired(String),

    #[error("{message}")]
    Validation { message: String, status: u16 },

    #[error("{message}")]
    NotFound { message: String, status: u16 },

    #[error("{message}")]
    ServerFault { message: String, status: u16 },

    #[error("Request cancelled")]
    Cancelled,

    #[error("{message}")]
    Unknown { message: String, status: Option<u16> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential store error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Get the classification for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::AuthRequired(_) => ErrorKind::AuthRequired,
            Self::SessionExpired(_) => ErrorKind::SessionExpired,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ServerFault { .. } => ErrorKind::ServerFault,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Unknown { .. } => ErrorKind::Unknown,
            Self::Config(_) => ErrorKind::Config,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// HTTP status that produced this error, when one was received.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Validation { status, .. }
            | Self::NotFound { status, .. }
            | Self::ServerFault { status, .. } => Some(*status),
            Self::Unknown { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the caller should redirect the user to the login screen.
    pub fn requires_login(&self) -> bool {
        matches!(self.kind(), ErrorKind::AuthRequired | ErrorKind::SessionExpired)
    }
}
