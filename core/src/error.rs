//! The single failure type surfaced by every operation, and the procedure
//! that turns an unsuccessful response into one.
//!
//! # Design
//! Callers only ever see "the request failed" plus a human-readable message.
//! Transport failures, non-2xx statuses and undecodable success bodies all
//! land in `ApiError`; `status` is kept when a response was received so
//! hosts can branch on it without parsing text.

use serde_json::Value;

/// A failed request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    status: Option<u16>,
    message: String,
}

impl ApiError {
    /// No response was received (DNS, refused connection, broken stream).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// A response was received but could not be used.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// The request could not be built.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::transport(message)
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Convert an unsuccessful response into an `ApiError`.
///
/// A truthy `message` in a JSON object body replaces `default_message`.
/// 403, 404 and 500 always use their fixed text.
pub fn map_error_response(status: u16, body: &str, default_message: &str) -> ApiError {
    let message = server_message(body).unwrap_or_else(|| default_message.to_string());

    let message = match status {
        400 => or_fallback(message, "bad request"),
        401 => or_fallback(message, "unauthorized"),
        403 => "insufficient permissions".to_string(),
        404 => "resource not found".to_string(),
        500 => "server error, try later".to_string(),
        other => or_fallback(message, &format!("error (status {other})")),
    };
    ApiError::with_status(status, message)
}

/// The server-provided `message`, if the body is JSON and carries one.
/// Any parse failure yields `None`.
///
/// `null`, `false`, `0` and `""` count as absent. Other non-string values
/// are rendered as their JSON text.
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("message")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.is_empty() => None,
        Value::String(message) => Some(message.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

fn or_fallback(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
