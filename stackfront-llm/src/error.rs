//! Client error types.

use stackfront_core::StackfrontError;
use thiserror::Error;

/// Errors that can occur while loading, holding, or calling a backend client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend configuration cannot produce a client.
    #[error("Configuration problem: {0}")]
    Configuration(String),

    /// No client has been loaded yet.
    #[error("Llama Stack client has not been initialised. Ensure 'load(..)' has been called.")]
    Uninitialized,

    /// The in-process engine failed to start.
    #[error("Library client initialisation failed: {0}")]
    Initialization(String),

    /// A default header cannot be sent over HTTP.
    #[error("Invalid header {0}")]
    InvalidHeader(String),

    /// HTTP request failed.
    #[error("Backend request failed: {0}")]
    RequestFailed(String),

    /// Request timed out.
    #[error("Backend request timed out after {0}ms")]
    Timeout(u64),

    /// Backend service is unreachable.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

// Timeouts are mapped where the configured limit is known.
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            ClientError::Unavailable(err.to_string())
        } else {
            ClientError::RequestFailed(err.to_string())
        }
    }
}

impl From<StackfrontError> for ClientError {
    fn from(err: StackfrontError) -> Self {
        match err {
            StackfrontError::Config(msg) => ClientError::Configuration(msg),
            other => ClientError::Configuration(other.to_string()),
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ClientError>;
