//! Legal document types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row in a document listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full document payload as returned by the JSON representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDetail {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub doc_type: Option<String>,
}

/// Requested representation for a document export.
///
/// Non-JSON formats are negotiated through the `Accept` header and come
/// back as plain text bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Markdown,
    Html,
}

impl DocumentFormat {
    /// `Accept` header value for this format, if it deviates from the
    /// JSON default.
    pub fn accept_header(self) -> Option<&'static str> {
        match self {
            Self::Json => None,
            Self::Markdown => Some("text/markdown"),
            Self::Html => Some("text/html"),
        }
    }
}

/// Server acknowledgement for a binary upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub id: String,
    pub file_name: String,
}
