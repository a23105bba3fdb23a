//! Error types for the GameHub API client.
//!
//! # Design
//! Every failure collapses into `ApiError`, and every variant carries a
//! non-empty human-readable message. The variants record where the message
//! came from (backend, network, JSON, storage) for logging; callers only need
//! `is_err()` and `message()`.

use thiserror::Error;

/// Fallback message when a failed response carries no `error` field.
pub const GENERIC_FAILURE: &str = "API request failed";

/// Errors returned by the client, the driver and token stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The backend rejected the request: non-2xx status, or a body with
    /// `"success": false`.
    #[error("{message}")]
    RequestFailed { status: u16, message: String },

    /// The request never produced a response (connection refused, DNS, TLS).
    #[error("{0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// An authenticated call that cannot proceed without a session token.
    #[error("No token")]
    NotAuthenticated,

    /// Durable token storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Human-readable failure message. Never empty.
    pub fn message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        }
    }

    /// HTTP status of a backend rejection, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
