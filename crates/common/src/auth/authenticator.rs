//! Interactive authorization surface supplied by the host platform

use async_trait::async_trait;
use url::Url;

use super::error::OAuthError;

/// Presents the authorization URL to the user and returns where the server
/// redirected them
///
/// Implementations wrap a system browser session, an embedded web view, or
/// a loopback listener. The engine awaits this call for as long as the user
/// takes.
#[async_trait]
pub trait ExternalAuthenticator: Send + Sync {
    /// Run the interactive step
    ///
    /// Returns the raw callback URL whose scheme is `callback_scheme`.
    ///
    /// # Errors
    /// - `OAuthError::Cancelled` when the user dismissed the flow
    /// - `OAuthError::AuthenticationFailed` on a platform failure
    /// - `OAuthError::InvalidCallbackURL` when no callback was produced
    async fn authenticate(
        &self,
        authorization_url: &Url,
        callback_scheme: &str,
    ) -> Result<String, OAuthError>;
}
