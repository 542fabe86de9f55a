//! Response normalizer
//!
//! Converts a completed response into the success payload or a typed
//! error with a human-readable message. Servers in this domain disagree
//! about error-body shape, so extraction probes the known variants before
//! falling back to status-derived text.

use reqwest::StatusCode;
use serde_json::Value;

use crate::dispatch::RawResponse;
use crate::errors::ApiError;

/// Success passthrough, or the normalized error for a non-2xx response.
pub fn into_result(raw: RawResponse) -> Result<RawResponse, ApiError> {
    if raw.is_success() {
        Ok(raw)
    } else {
        Err(error_from_response(raw.status, &raw.body))
    }
}

/// Map a non-success response to the error taxonomy.
pub fn error_from_response(status: StatusCode, body: &[u8]) -> ApiError {
    let message = extract_message(status, body);
    match status.as_u16() {
        400 | 422 => ApiError::Validation { message, status: status.as_u16() },
        404 => ApiError::NotFound { message, status: status.as_u16() },
        401 | 403 => ApiError::AuthRequired(message),
        code if status.is_server_error() => ApiError::ServerFault { message, status: code },
        code => ApiError::Unknown { message, status: Some(code) },
    }
}

/// Best human-readable message for an error response.
pub fn extract_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        if let Some(message) = message_from_value(&value) {
            return message;
        }
    }
    status_fallback(status)
}

fn message_from_value(value: &Value) -> Option<String> {
    // `detail` carries a plain string, a list of field-level validation
    // errors, or a nested object depending on the server.
    if let Some(detail) = value.get("detail") {
        match detail {
            Value::String(text) if !text.is_empty() => return Some(text.clone()),
            Value::Array(items) if !items.is_empty() => {
                return Some(
                    items.iter().map(field_error_text).collect::<Vec<_>>().join("; "),
                );
            }
            Value::Object(_) => return Some(detail.to_string()),
            _ => {}
        }
    }
    for key in ["message", "error"] {
        if let Some(Value::String(text)) = value.get(key) {
            if !text.is_empty() {
                return Some(text.clone());
            }
        }
    }
    None
}

fn field_error_text(item: &Value) -> String {
    match item {
        Value::String(text) => text.clone(),
        Value::Object(map) => {
            let msg = map.get("msg").and_then(Value::as_str).unwrap_or("invalid value");
            let field = map
                .get("loc")
                .and_then(Value::as_array)
                .map(|loc| {
                    loc.iter()
                        .filter_map(|part| match part {
                            Value::String(name) => Some(name.clone()),
                            Value::Number(index) => Some(index.to_string()),
                            _ => None,
                        })
                        .collect::<Vec<_>>()
                        .join(".")
                })
                .unwrap_or_default();
            if field.is_empty() {
                msg.to_string()
            } else {
                format!("{field}: {msg}")
            }
        }
        other => other.to_string(),
    }
}

fn status_fallback(status: StatusCode) -> String {
    match status.as_u16() {
        403 => "Access forbidden".to_string(),
        404 => "Resource not found".to_string(),
        500 => "Server error".to_string(),
        _ => status.to_string(),
    }
}
