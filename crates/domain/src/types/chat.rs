//! Research-chat types

use serde::{Deserialize, Serialize};

/// Message sent to the research assistant.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub message: String,
}

/// Assistant reply, tagged with the session it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: String,
    pub reply: String,
}
