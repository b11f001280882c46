//! Client error types

use stockroom_core::CoreError;
use thiserror::Error;

/// Why a session refresh did not produce a new access token
///
/// Cloneable so that one failure can be handed to every request queued
/// behind the refresh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// Access or refresh token missing from the credential store
    #[error("No stored credentials to refresh the session with")]
    MissingCredentials,

    /// Refresh endpoint answered with a non-success status
    #[error("Refresh rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Refresh endpoint could not be reached
    #[error("Refresh request failed: {0}")]
    Transport(String),

    /// Refresh endpoint answered with an unexpected body
    #[error("Invalid refresh response: {0}")]
    InvalidResponse(String),

    /// New credentials could not be persisted
    #[error("Failed to store refreshed credentials: {0}")]
    Store(#[from] CoreError),

    /// The refresh owner went away before settling the cycle
    #[error("Session refresh was abandoned before it completed")]
    Abandoned,
}

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Request was rejected with 401 and cannot be recovered by a refresh
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Session could not be refreshed; stored credentials have been cleared
    #[error("Session expired: {0}")]
    AuthExpired(RefreshError),

    /// The refresh this request depended on stopped before producing an
    /// outcome; the stored session is untouched
    #[error("Session refresh interrupted")]
    RefreshInterrupted,

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Credential store failure outside of a refresh cycle
    #[error("Credential store error: {0}")]
    Store(#[from] CoreError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl From<RefreshError> for ClientError {
    fn from(error: RefreshError) -> Self {
        match error {
            RefreshError::Abandoned => Self::RefreshInterrupted,
            error => Self::AuthExpired(error),
        }
    }
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// HTTP status behind this error, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::ServerError { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::AuthExpired(RefreshError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// True when the caller must treat the user as logged out
    pub const fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_maps_known_codes() {
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_REQUEST, "bad".into()),
            ClientError::BadRequest(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, "no".into()),
            ClientError::Unauthorized(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::NOT_FOUND, "gone".into()),
            ClientError::NotFound(_)
        ));
    }

    #[test]
    fn test_server_error_preserves_status_and_body() {
        let error = ClientError::from_status(StatusCode::BAD_GATEWAY, "upstream down".into());
        assert_eq!(error.status(), Some(502));
        assert!(error.to_string().contains("upstream down"));
        assert!(!error.is_auth_expired());
    }

    #[test]
    fn test_refresh_rejection_is_auth_expired() {
        let error = ClientError::from(RefreshError::Rejected {
            status: 401,
            message: "expired".into(),
        });
        assert!(error.is_auth_expired());
        assert_eq!(error.status(), Some(401));
    }

    #[test]
    fn test_abandoned_refresh_is_not_auth_expired() {
        let error = ClientError::from(RefreshError::Abandoned);
        assert!(matches!(error, ClientError::RefreshInterrupted));
        assert!(!error.is_auth_expired());
        assert_eq!(error.status(), None);
    }
}
