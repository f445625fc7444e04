//! Error types for the publish module.

use thiserror::Error;

/// Errors that can occur while writing an asset to the content store.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Transport-level failure talking to the store.
    #[error("network error publishing {path}: {source}")]
    Network {
        /// Remote path being published.
        path: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The credential was missing, expired, or lacks write scope.
    #[error("not authorized to publish {path} (HTTP {status})")]
    Unauthorized {
        /// Remote path being published.
        path: String,
        /// The HTTP status code (401 or 403).
        status: u16,
    },

    /// The object changed underneath us (stale revision, or created
    /// concurrently by someone else).
    #[error("revision conflict publishing {path}")]
    Conflict {
        /// Remote path being published.
        path: String,
    },

    /// Any other non-success response from the store.
    #[error("store returned HTTP {status} for {path}: {message}")]
    Api {
        /// Remote path being published.
        path: String,
        /// The HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The store answered with a body we could not interpret.
    #[error("unexpected response for {path}: {reason}")]
    InvalidResponse {
        /// Remote path being published.
        path: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// Store configuration is unusable (bad API base URL, client build failure).
    #[error("invalid store configuration: {reason}")]
    Config {
        /// Description of the problem.
        reason: String,
    },
}

impl PublishError {
    /// Creates a network error.
    pub fn network(path: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            path: path.into(),
            source,
        }
    }

    /// Creates a revision conflict error.
    pub fn conflict(path: impl Into<String>) -> Self {
        Self::Conflict { path: path.into() }
    }

    /// Maps a non-success status to the matching variant.
    pub fn from_status(path: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        let path = path.into();
        match status {
            401 | 403 => Self::Unauthorized { path, status },
            409 | 422 => Self::Conflict { path },
            _ => Self::Api {
                path,
                status,
                message: message.into(),
            },
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_auth_codes() {
        let err = PublishError::from_status("images/a.jpg", 401, "Bad credentials");
        assert!(matches!(err, PublishError::Unauthorized { status: 401, .. }));
        let err = PublishError::from_status("images/a.jpg", 403, "forbidden");
        assert!(matches!(err, PublishError::Unauthorized { status: 403, .. }));
    }

    #[test]
    fn test_from_status_maps_conflicts() {
        assert!(matches!(
            PublishError::from_status("images/a.jpg", 409, "sha mismatch"),
            PublishError::Conflict { .. }
        ));
        assert!(matches!(
            PublishError::from_status("images/a.jpg", 422, "sha wasn't supplied"),
            PublishError::Conflict { .. }
        ));
    }

    #[test]
    fn test_from_status_keeps_message_for_other_codes() {
        let err = PublishError::from_status("images/a.jpg", 500, "Server Error");
        let msg = err.to_string();
        assert!(msg.contains("500"), "Expected status in: {msg}");
        assert!(msg.contains("images/a.jpg"), "Expected path in: {msg}");
        assert!(msg.contains("Server Error"), "Expected message in: {msg}");
    }
}
