//! Error types and response helpers for the hosted backend

use serde::Deserialize;
use thiserror::Error;
use xylos_application::{AuthError, EndpointError, ImageError, StoreError};

/// Errors raised while setting up the backend client
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend.url is not set")]
    MissingUrl,

    #[error("Invalid backend url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// Fields the backend uses for error text, depending on the service.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<serde_json::Value>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

/// Extract a human-readable message from an error response body.
///
/// Auth answers `{"error_description": ...}` or `{"msg": ...}`, functions
/// answer `{"error": "..."}` and storage answers `{"message": ...}`.
pub fn rejection_message(body: &str, fallback: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let from_error = parsed.error.and_then(|e| match e {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Object(map) => map
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_owned),
        _ => None,
    });

    parsed
        .error_description
        .or(parsed.msg)
        .or(from_error)
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

pub(crate) fn endpoint_send_error(e: reqwest::Error) -> EndpointError {
    if e.is_timeout() {
        EndpointError::Timeout
    } else if e.is_connect() {
        EndpointError::ConnectionError(e.to_string())
    } else {
        EndpointError::RequestFailed(e.to_string())
    }
}

pub(crate) fn image_send_error(e: reqwest::Error) -> ImageError {
    ImageError::ConnectionError(e.to_string())
}

pub(crate) fn store_send_error(e: reqwest::Error) -> StoreError {
    StoreError::RequestFailed(e.to_string())
}

pub(crate) fn auth_send_error(e: reqwest::Error) -> AuthError {
    AuthError::ConnectionError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_error_field() {
        assert_eq!(
            rejection_message(r#"{"error":"Rate limit exceeded"}"#, "fallback"),
            "Rate limit exceeded"
        );
    }

    #[test]
    fn test_auth_error_fields() {
        assert_eq!(
            rejection_message(
                r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
                "fallback"
            ),
            "Invalid login credentials"
        );
        assert_eq!(
            rejection_message(r#"{"code":400,"msg":"User already registered"}"#, "fallback"),
            "User already registered"
        );
    }

    #[test]
    fn test_nested_error_object() {
        assert_eq!(
            rejection_message(r#"{"error":{"message":"quota"}}"#, "fallback"),
            "quota"
        );
    }

    #[test]
    fn test_fallback() {
        assert_eq!(
            rejection_message("<html>502</html>", "Failed to get AI response"),
            "Failed to get AI response"
        );
        assert_eq!(rejection_message(r#"{"error":""}"#, "fb"), "fb");
        assert_eq!(rejection_message("", "fb"), "fb");
    }
}
