//! Infrastructure error type.

use rxauth_common::OAuthError;
use thiserror::Error;

/// Failure loading or applying host configuration
#[derive(Debug, Error)]
pub enum InfraError {
    /// Missing, malformed or unsupported configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Engine construction failed
    #[error("Auth engine error: {0}")]
    Auth(#[from] OAuthError),
}

/// Result alias for infrastructure operations
pub type Result<T> = std::result::Result<T, InfraError>;
