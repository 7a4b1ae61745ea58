//! Error taxonomy for the authentication engine

use thiserror::Error;

use super::storage::StorageError;

/// Errors surfaced by the authentication engine and its HTTP client
///
/// Display strings are short and human readable; the engine copies them
/// into `error_message` for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OAuthError {
    /// An endpoint URL could not be derived, or no access token was
    /// available to call it with
    #[error("Invalid URL configuration")]
    InvalidURL,

    /// Issuer, authorize path or redirect URI are unusable
    #[error("Invalid OAuth configuration")]
    InvalidConfiguration,

    /// The external authenticator failed for a platform reason
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The token endpoint rejected the authorization code
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// The token endpoint rejected the refresh token (non-200 response)
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Transport-level failure talking to the authorization server
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The user-info endpoint failed or returned an unusable profile
    #[error("Failed to fetch user info: {0}")]
    UserInfoFailed(String),

    /// No refresh token is stored
    #[error("No refresh token available")]
    NoRefreshToken,

    /// The callback URL was missing, unparsable or had no `code`
    #[error("Invalid callback URL received")]
    InvalidCallbackURL,

    /// The user dismissed the external authenticator
    #[error("Authentication was cancelled")]
    Cancelled,

    /// A 200 token response body could not be decoded
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// Persisting tokens failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl OAuthError {
    /// True when the user dismissed the authenticator
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// True when the authorization server rejected the session's refresh
    /// token; the engine has already logged out when this is returned
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::TokenRefreshFailed(_))
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(err: reqwest::Error) -> Self {
        Self::NetworkError(err.to_string())
    }
}
