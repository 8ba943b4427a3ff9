//! Maps HTTP outcomes onto [`CoduxError`].
//!
//! Rules, first match wins:
//!
//! | Outcome | Error |
//! |---------|-------|
//! | 404 on any endpoint | `NotFound` |
//! | 409 on `packages` | `AlreadyExists` |
//! | any other non-2xx | `TransportFailure { status: Some(_) }` |
//! | no response (connect, timeout, DNS, TLS, body read) | `TransportFailure { status: None }` |
//!
//! The message comes from the body's `message` field when the body is a JSON
//! object carrying one. Otherwise a fixed default (404/409) or the transport
//! description is used; a body that fails to decode never replaces the real
//! failure.

use crate::error::CoduxError;
use reqwest::{Method, StatusCode};
use serde_json::Value;

/// Endpoint whose 409 responses mean "package already installed".
pub(crate) const PACKAGES_ENDPOINT: &str = "packages";

const NOT_FOUND_MESSAGE: &str = "resource not found";
const ALREADY_EXISTS_MESSAGE: &str = "package already installed";

/// Classify a non-success response.
///
/// `endpoint` is the path relative to the base URL, with or without a
/// leading slash.
pub(crate) fn classify_status(
    method: &Method,
    endpoint: &str,
    status: StatusCode,
    body: &[u8],
) -> CoduxError {
    let endpoint = endpoint.trim_start_matches('/');
    let message = body_message(body);

    match status {
        StatusCode::NOT_FOUND => {
            CoduxError::NotFound(message.unwrap_or_else(|| NOT_FOUND_MESSAGE.to_string()))
        }
        StatusCode::CONFLICT if endpoint == PACKAGES_ENDPOINT => {
            CoduxError::AlreadyExists(message.unwrap_or_else(|| ALREADY_EXISTS_MESSAGE.to_string()))
        }
        _ => CoduxError::TransportFailure {
            status: Some(status.as_u16()),
            message: message.unwrap_or_else(|| describe_status(method, endpoint, status)),
        },
    }
}

/// Classify a failure that produced no usable response.
pub(crate) fn classify_network(err: &reqwest::Error) -> CoduxError {
    let message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    CoduxError::TransportFailure {
        status: err.status().map(|status| status.as_u16()),
        message,
    }
}

/// Extract a string `message` from a JSON object body.
fn body_message(body: &[u8]) -> Option<String> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn describe_status(method: &Method, endpoint: &str, status: StatusCode) -> String {
    format!(
        "HTTP {} {} for {} /{}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status"),
        method,
        endpoint
    )
}
