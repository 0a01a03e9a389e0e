//! Shared reqwest helpers for the HTTP adapters.

use embed_preflight_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::time::Duration;

pub fn build_client(namespace: &str, timeout_ms: u64, headers: HeaderMap) -> Result<reqwest::Client> {
    if timeout_ms == 0 {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "timeout must be greater than zero",
        ));
    }
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .default_headers(headers)
        .build()
        .map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::new(namespace, "client_init_failed"),
                format!("failed to build HTTP client: {error}"),
                ErrorClass::NonRetriable,
            )
        })
}

pub fn map_reqwest_error(namespace: &str, label: &str, error: &reqwest::Error) -> ErrorEnvelope {
    if error.is_timeout() {
        return ErrorEnvelope::unexpected(
            ErrorCode::timeout(),
            format!("{label} request timed out"),
            ErrorClass::Retriable,
        );
    }
    if error.is_connect() {
        return ErrorEnvelope::unexpected(
            ErrorCode::io(),
            format!("{label} connection failed: {error}"),
            ErrorClass::Retriable,
        );
    }
    ErrorEnvelope::unexpected(
        ErrorCode::new(namespace, "request_failed"),
        format!("{label} request failed: {error}"),
        ErrorClass::NonRetriable,
    )
}

pub fn map_decode_error(namespace: &str, label: &str, error: &serde_json::Error) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::new(namespace, "invalid_response"),
        format!("failed to decode {label} response: {error}"),
        ErrorClass::NonRetriable,
    )
}

/// Envelope for a non-success status that has no more specific mapping.
pub fn status_error(namespace: &str, status: StatusCode, message: String) -> ErrorEnvelope {
    let envelope = match status.as_u16() {
        401 | 403 => ErrorEnvelope::expected(ErrorCode::permission_denied(), message),
        408 => ErrorEnvelope::unexpected(ErrorCode::timeout(), message, ErrorClass::Retriable),
        _ if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            ErrorEnvelope::unexpected(
                ErrorCode::new(namespace, "http_error"),
                message,
                ErrorClass::Retriable,
            )
        },
        _ => ErrorEnvelope::unexpected(
            ErrorCode::new(namespace, "http_error"),
            message,
            ErrorClass::NonRetriable,
        ),
    };
    envelope.with_metadata("status", status.as_u16().to_string())
}
