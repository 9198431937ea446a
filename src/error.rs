//! Error types for debrid-tracker
//!
//! This module provides the error handling for the crate, including:
//! - Domain-specific error types (upstream API failures, store failures, config)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for debrid-tracker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for debrid-tracker
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "BIND_ADDRESS")
        key: Option<String>,
    },

    /// The debrid API credential is not configured
    #[error("debrid API key not set")]
    NotConfigured,

    /// Unknown local torrent record
    #[error("torrent not found: {0}")]
    NotFound(String),

    /// The torrent's content has not been confirmed on the mirror yet
    #[error("mirror not available for torrent {id}")]
    MirrorUnavailable {
        /// The torrent whose mirror copy is not confirmed
        id: String,
    },

    /// The debrid API answered with a non-success status
    #[error("upstream returned HTTP {status}: {message}")]
    Upstream {
        /// HTTP status code returned by the upstream service
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Malformed request from an API client
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error talking to the debrid API or the mirror
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Upstream status code, if this error came from a non-success response
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the debrid API has not registered the torrent yet (HTTP 404)
    pub fn is_upstream_not_found(&self) -> bool {
        self.upstream_status() == Some(404)
    }

    /// True when the debrid API rejected the call with HTTP 429
    pub fn is_rate_limited(&self) -> bool {
        self.upstream_status() == Some(429)
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Constraint violation (e.g., duplicate key)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// API error response format
///
/// Returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "torrent not found: ABC123",
///     "details": {
///       "torrent_id": "ABC123"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "not_configured")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Config { .. } => 400,
            Error::NotConfigured => 400,
            Error::MirrorUnavailable { .. } => 400,
            Error::InvalidRequest(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 409 Conflict - duplicate torrent id or hash
            Error::Database(DatabaseError::ConstraintViolation(_)) => 409,

            // 500 Internal Server Error - upstream failures surface as 500 for request-triggered calls
            Error::Upstream { .. } => 500,
            Error::Network(_) => 500,
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::NotConfigured => "not_configured",
            Error::NotFound(_) => "not_found",
            Error::MirrorUnavailable { .. } => "mirror_unavailable",
            Error::Upstream { status: 404, .. } => "upstream_not_found",
            Error::Upstream { status: 429, .. } => "upstream_rate_limited",
            Error::Upstream { .. } => "upstream_error",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Database(DatabaseError::ConstraintViolation(_)) => "conflict",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::NotFound(id) => Some(serde_json::json!({
                "torrent_id": id,
            })),
            Error::MirrorUnavailable { id } => Some(serde_json::json!({
                "torrent_id": id,
            })),
            Error::Upstream { status, .. } => Some(serde_json::json!({
                "upstream_status": status,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    /// Returns (Error, expected_status_code, expected_error_code) for every
    /// reachable match arm in ToHttpStatus.
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "bad value".into(),
                    key: Some("BIND_ADDRESS".into()),
                },
                400,
                "config_error",
            ),
            (Error::NotConfigured, 400, "not_configured"),
            (Error::NotFound("ABC".into()), 404, "not_found"),
            (
                Error::MirrorUnavailable { id: "ABC".into() },
                400,
                "mirror_unavailable",
            ),
            (
                Error::Upstream {
                    status: 404,
                    message: "unknown_ressource".into(),
                },
                500,
                "upstream_not_found",
            ),
            (
                Error::Upstream {
                    status: 429,
                    message: "too_many_requests".into(),
                },
                500,
                "upstream_rate_limited",
            ),
            (
                Error::Upstream {
                    status: 503,
                    message: "service_unavailable".into(),
                },
                500,
                "upstream_error",
            ),
            (
                Error::InvalidRequest("missing file".into()),
                400,
                "invalid_request",
            ),
            (
                Error::Database(DatabaseError::ConstraintViolation("dup".into())),
                409,
                "conflict",
            ),
            (
                Error::Database(DatabaseError::QueryFailed("boom".into())),
                500,
                "database_error",
            ),
            (
                Error::Io(std::io::Error::other("disk")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind".into()),
                500,
                "api_server_error",
            ),
            (Error::Other("x".into()), 500, "internal_error"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            assert_eq!(
                error.status_code(),
                expected_status,
                "error_code={expected_code} returned the wrong status"
            );
        }
    }

    #[test]
    fn every_variant_maps_to_expected_error_code() {
        for (error, _, expected_code) in all_error_variants() {
            assert_eq!(error.error_code(), expected_code);
        }
    }

    #[test]
    fn upstream_classification_helpers() {
        let not_found = Error::Upstream {
            status: 404,
            message: String::new(),
        };
        let limited = Error::Upstream {
            status: 429,
            message: String::new(),
        };

        assert!(not_found.is_upstream_not_found());
        assert!(!not_found.is_rate_limited());
        assert!(limited.is_rate_limited());
        assert!(!Error::NotConfigured.is_rate_limited());
        assert_eq!(Error::NotConfigured.upstream_status(), None);
    }

    #[test]
    fn api_error_from_not_found_has_torrent_id() {
        let api_error: ApiError = Error::NotFound("XYZ".into()).into();
        assert_eq!(api_error.error.code, "not_found");
        assert_eq!(api_error.error.details.unwrap()["torrent_id"], "XYZ");
    }

    #[test]
    fn api_error_from_upstream_has_status() {
        let api_error: ApiError = Error::Upstream {
            status: 503,
            message: "down".into(),
        }
        .into();
        assert_eq!(api_error.error.details.unwrap()["upstream_status"], 503);
    }

    #[test]
    fn api_error_from_not_configured_has_no_details() {
        let api_error: ApiError = Error::NotConfigured.into();
        assert!(api_error.error.details.is_none());
        assert_eq!(api_error.error.message, "debrid API key not set");
    }
}
