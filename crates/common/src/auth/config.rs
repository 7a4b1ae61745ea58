//! Authorization server configuration
//!
//! Immutable once handed to the engine. Endpoint URLs are derived by
//! appending the configured path suffixes to the issuer.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::duration_secs;

/// Default scopes requested when none are configured
pub const DEFAULT_SCOPES: [&str; 3] = ["openid", "profile", "email"];
/// Default authorize endpoint suffix
pub const DEFAULT_AUTHORIZE_PATH: &str = "/api/oauth/authorize";
/// Default token endpoint suffix
pub const DEFAULT_TOKEN_PATH: &str = "/api/oauth/token";
/// Default user-info endpoint suffix
pub const DEFAULT_USER_INFO_PATH: &str = "/api/oauth/userinfo";
/// Default secure storage namespace
pub const DEFAULT_STORAGE_NAMESPACE: &str = "com.rxauth.session";
/// Default periodic refresh interval
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// OAuth client configuration for one authorization server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Issuer base URL (e.g. `https://auth.example.com`)
    pub issuer: String,

    /// OAuth client ID
    pub client_id: String,

    /// Redirect URI registered with the server (e.g. `myapp://callback`)
    pub redirect_uri: String,

    /// Scopes requested during authorization
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Path appended to the issuer for the authorize endpoint
    #[serde(default = "default_authorize_path")]
    pub authorize_path: String,

    /// Path appended to the issuer for the token endpoint
    #[serde(default = "default_token_path")]
    pub token_path: String,

    /// Path appended to the issuer for the user-info endpoint
    #[serde(default = "default_user_info_path")]
    pub user_info_path: String,

    /// Namespace (keychain service) the session is stored under
    #[serde(default = "default_storage_namespace")]
    pub storage_namespace: String,

    /// How often the engine refreshes tokens while authenticated
    #[serde(
        rename = "refresh_interval_secs",
        with = "duration_secs",
        default = "default_refresh_interval"
    )]
    pub refresh_interval: Duration,
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(ToString::to_string).collect()
}

fn default_authorize_path() -> String {
    DEFAULT_AUTHORIZE_PATH.to_string()
}

fn default_token_path() -> String {
    DEFAULT_TOKEN_PATH.to_string()
}

fn default_user_info_path() -> String {
    DEFAULT_USER_INFO_PATH.to_string()
}

fn default_storage_namespace() -> String {
    DEFAULT_STORAGE_NAMESPACE.to_string()
}

const fn default_refresh_interval() -> Duration {
    DEFAULT_REFRESH_INTERVAL
}

impl AuthConfig {
    /// Create a configuration with default scopes, paths and namespace
    ///
    /// # Examples
    /// ```
    /// use rxauth_common::auth::AuthConfig;
    ///
    /// let config = AuthConfig::new("https://auth.example.com", "client", "myapp://callback");
    /// assert_eq!(config.scope_string(), "openid profile email");
    /// assert_eq!(config.redirect_scheme().as_deref(), Some("myapp"));
    /// ```
    pub fn new(
        issuer: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scopes: default_scopes(),
            authorize_path: default_authorize_path(),
            token_path: default_token_path(),
            user_info_path: default_user_info_path(),
            storage_namespace: default_storage_namespace(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    /// Replace the requested scopes
    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the three endpoint path suffixes
    #[must_use]
    pub fn with_paths(
        mut self,
        authorize_path: impl Into<String>,
        token_path: impl Into<String>,
        user_info_path: impl Into<String>,
    ) -> Self {
        self.authorize_path = authorize_path.into();
        self.token_path = token_path.into();
        self.user_info_path = user_info_path.into();
        self
    }

    /// Replace the storage namespace
    #[must_use]
    pub fn with_storage_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.storage_namespace = namespace.into();
        self
    }

    /// Replace the periodic refresh interval
    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// `issuer + authorize_path`, `None` if that is not a valid URL
    #[must_use]
    pub fn authorize_url(&self) -> Option<Url> {
        self.endpoint(&self.authorize_path)
    }

    /// `issuer + token_path`, `None` if that is not a valid URL
    #[must_use]
    pub fn token_url(&self) -> Option<Url> {
        self.endpoint(&self.token_path)
    }

    /// `issuer + user_info_path`, `None` if that is not a valid URL
    #[must_use]
    pub fn user_info_url(&self) -> Option<Url> {
        self.endpoint(&self.user_info_path)
    }

    /// Scheme of the redirect URI, `None` if it cannot be parsed
    #[must_use]
    pub fn redirect_scheme(&self) -> Option<String> {
        Url::parse(&self.redirect_uri).ok().map(|url| url.scheme().to_string())
    }

    /// Scopes joined with single spaces
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// Interval between periodic refreshes
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    // String concatenation, not RFC 3986 joining: an issuer with a path
    // prefix keeps it.
    fn endpoint(&self, path: &str) -> Option<Url> {
        Url::parse(&format!("{}{}", self.issuer, path)).ok()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::config.
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new("https://auth.example.com", "test-client", "myapp://callback")
    }

    /// Validates `AuthConfig::new` defaults.
    ///
    /// Assertions:
    /// - Scopes default to openid, profile and email.
    /// - Paths default to the `/api/oauth/*` suffixes.
    /// - Namespace and refresh interval take their defaults.
    #[test]
    fn test_default_values() {
        let config = config();

        assert_eq!(config.scopes, vec!["openid", "profile", "email"]);
        assert_eq!(config.authorize_path, "/api/oauth/authorize");
        assert_eq!(config.token_path, "/api/oauth/token");
        assert_eq!(config.user_info_path, "/api/oauth/userinfo");
        assert_eq!(config.storage_namespace, DEFAULT_STORAGE_NAMESPACE);
        assert_eq!(config.refresh_interval(), Duration::from_secs(300));
    }

    /// Validates derived endpoint URLs and the redirect scheme.
    #[test]
    fn test_url_construction() {
        let config = config();

        assert_eq!(
            config.authorize_url().unwrap().as_str(),
            "https://auth.example.com/api/oauth/authorize"
        );
        assert_eq!(config.token_url().unwrap().as_str(), "https://auth.example.com/api/oauth/token");
        assert_eq!(
            config.user_info_url().unwrap().as_str(),
            "https://auth.example.com/api/oauth/userinfo"
        );
        assert_eq!(config.redirect_scheme().as_deref(), Some("myapp"));
    }

    /// Validates builder overrides for scopes, paths and namespace.
    #[test]
    fn test_custom_endpoints() {
        let config = config()
            .with_scopes(["openid", "offline_access"])
            .with_paths("/authorize", "/token", "/me")
            .with_storage_namespace("com.example.app")
            .with_refresh_interval(Duration::from_secs(60));

        assert_eq!(config.scope_string(), "openid offline_access");
        assert_eq!(config.authorize_url().unwrap().as_str(), "https://auth.example.com/authorize");
        assert_eq!(config.token_url().unwrap().as_str(), "https://auth.example.com/token");
        assert_eq!(config.user_info_url().unwrap().as_str(), "https://auth.example.com/me");
        assert_eq!(config.storage_namespace, "com.example.app");
        assert_eq!(config.refresh_interval(), Duration::from_secs(60));
    }

    /// Validates unusable issuers and redirect URIs derive to `None`.
    #[test]
    fn test_invalid_urls_derive_none() {
        let config = AuthConfig::new("not a url", "client", "no scheme here");

        assert!(config.authorize_url().is_none());
        assert!(config.token_url().is_none());
        assert!(config.user_info_url().is_none());
        assert!(config.redirect_scheme().is_none());
    }

    /// Validates deserialization fills defaults for omitted fields.
    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "issuer": "https://auth.example.com",
            "client_id": "abc",
            "redirect_uri": "myapp://callback",
            "refresh_interval_secs": 120
        }"#;
        let config: AuthConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.client_id, "abc");
        assert_eq!(config.scopes, vec!["openid", "profile", "email"]);
        assert_eq!(config.token_path, DEFAULT_TOKEN_PATH);
        assert_eq!(config.refresh_interval(), Duration::from_secs(120));
    }
}
