//! Error types for the stackfront core library.

use thiserror::Error;

/// Top-level error type for core stackfront operations.
///
/// Turn-summary construction never produces one of these: malformed tool
/// output is absorbed by the summary builder. Only configuration loading
/// can fail.
#[derive(Error, Debug)]
pub enum StackfrontError {
    /// Configuration is missing, malformed, or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, StackfrontError>;
