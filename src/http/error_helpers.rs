//! Error handling utilities for HTTP responses and error context formatting.

use crate::errors::ContractError;
use reqwest::{Response, StatusCode};
use serde_json::Value;

/// Maximum characters to include from error body in context messages
const ERROR_BODY_PREVIEW_LENGTH: usize = 200;

const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";
const DEFAULT_ERROR_CODE: &str = "UNKNOWN_ERROR";

/// Reads a failed response and maps it to the matching [`ContractError`].
///
/// If the body cannot be read at all it is treated like an empty body.
pub async fn read_error(response: Response) -> ContractError {
    let status = response.status();
    let body = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Failed to read error body for HTTP {}: {}", status, e);
            String::new()
        }
    };
    error_from_body(status, &body)
}

/// Maps a status and raw error body to an error.
///
/// Bodies following `{ "message", "code", "details" }` keep those fields
/// (missing ones fall back to defaults). Anything else, including an empty
/// body or a JSON value that is not an object, yields code `HTTP_<status>`
/// and a message built from the status line and a body preview.
pub fn error_from_body(status: StatusCode, body: &str) -> ContractError {
    let status_code = status.as_u16();

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => {
            let message = map
                .get("message")
                .and_then(field_text)
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
            let code = map
                .get("code")
                .and_then(field_text)
                .unwrap_or_else(|| DEFAULT_ERROR_CODE.to_string());
            let details = map.get("details").filter(|d| !d.is_null()).cloned();
            ContractError::from_status(status_code, message, Some(code), details)
        }
        _ => {
            let preview = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unknown status").to_string()
            } else {
                truncate_for_context(body, ERROR_BODY_PREVIEW_LENGTH)
            };
            ContractError::from_status(
                status_code,
                format!("HTTP {status_code}: {preview}"),
                Some(format!("HTTP_{status_code}")),
                None,
            )
        }
    }
}

/// Renders an error-body field as text.
///
/// Strings are taken as is, arrays of strings are joined with `"; "`, and any
/// other non-null value falls back to its JSON text.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if items.iter().all(Value::is_string) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; "),
        ),
        other => Some(other.to_string()),
    }
}

/// Parses a successful response body, reporting a preview of it on failure.
pub fn parse_json_body(body: &[u8], context: &str) -> Result<Value, ContractError> {
    serde_json::from_slice(body).map_err(|e| {
        let text = String::from_utf8_lossy(body);
        let preview = truncate_for_context(&text, ERROR_BODY_PREVIEW_LENGTH);
        ContractError::MalformedResponse(format!(
            "{context}: JSON parse error: {e} | Context: {preview}"
        ))
    })
}

/// Truncates a string to at most `max_len` bytes plus "...", on a char boundary.
pub fn truncate_for_context(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
