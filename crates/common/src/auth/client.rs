//! OAuth 2.0 HTTP client for the authorization-code + PKCE grant
//!
//! Stateless: the PKCE pair and tokens are passed in by the engine, which
//! owns the flow. Handles:
//! - Authorization URL building
//! - Authorization code exchange
//! - Token refresh
//! - User-info fetch

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::config::AuthConfig;
use super::error::OAuthError;
use super::pkce::PKCEChallenge;
use super::types::{TokenResponse, User};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client bound to one authorization server configuration
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: AuthConfig,
    http: Client,
}

impl OAuthClient {
    /// Create a client with a 30 second request timeout
    ///
    /// # Examples
    /// ```
    /// use rxauth_common::auth::{AuthConfig, OAuthClient};
    ///
    /// let config = AuthConfig::new("https://auth.example.com", "client", "myapp://callback");
    /// let client = OAuthClient::new(config).unwrap();
    /// ```
    ///
    /// # Errors
    /// Returns `OAuthError::NetworkError` if the HTTP client (TLS backend)
    /// cannot be initialised
    pub fn new(config: AuthConfig) -> Result<Self, OAuthError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_http_client(config, http))
    }

    /// Create a client around a caller-supplied `reqwest::Client`
    #[must_use]
    pub fn with_http_client(config: AuthConfig, http: Client) -> Self {
        Self { config, http }
    }

    /// Configuration this client was built with
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Build the browser authorization URL for one PKCE attempt
    ///
    /// # Errors
    /// Returns `OAuthError::InvalidConfiguration` if the authorize endpoint
    /// cannot be derived from the issuer
    pub fn authorization_url(&self, pkce: &PKCEChallenge) -> Result<Url, OAuthError> {
        let mut url = self.config.authorize_url().ok_or(OAuthError::InvalidConfiguration)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scope_string())
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", pkce.challenge_method());
        Ok(url)
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    /// - `OAuthError::InvalidURL` if the token endpoint cannot be derived
    /// - `OAuthError::NetworkError` on transport failure
    /// - `OAuthError::TokenExchangeFailed` on a non-200 response
    /// - `OAuthError::InvalidResponse` if the body is not a token payload
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthError> {
        let token_url = self.config.token_url().ok_or(OAuthError::InvalidURL)?;
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];

        debug!(url = %token_url, "Exchanging authorization code");
        let response = self.http.post(token_url).form(&params).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Token exchange rejected");
            return Err(OAuthError::TokenExchangeFailed(describe_status(status)));
        }

        decode_body(response, OAuthError::InvalidResponse).await
    }

    /// Obtain a new access token with a refresh token
    ///
    /// # Errors
    /// - `OAuthError::InvalidConfiguration` if the token endpoint cannot be
    ///   derived
    /// - `OAuthError::NetworkError` on transport failure
    /// - `OAuthError::TokenRefreshFailed` on a non-200 response
    /// - `OAuthError::InvalidResponse` if the body is not a token payload
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, OAuthError> {
        let token_url = self.config.token_url().ok_or(OAuthError::InvalidConfiguration)?;
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
        ];

        debug!(url = %token_url, "Refreshing access token");
        let response = self.http.post(token_url).form(&params).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Token refresh rejected");
            return Err(OAuthError::TokenRefreshFailed(describe_status(status)));
        }

        decode_body(response, OAuthError::InvalidResponse).await
    }

    /// Fetch the profile of the user owning `access_token`
    ///
    /// # Errors
    /// - `OAuthError::InvalidURL` if the user-info endpoint cannot be derived
    /// - `OAuthError::NetworkError` on transport failure
    /// - `OAuthError::UserInfoFailed` on a non-200 response or an unusable
    ///   profile
    pub async fn fetch_user_info(&self, access_token: &str) -> Result<User, OAuthError> {
        let user_info_url = self.config.user_info_url().ok_or(OAuthError::InvalidURL)?;

        debug!(url = %user_info_url, "Fetching user info");
        let response = self.http.get(user_info_url).bearer_auth(access_token).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "User info request rejected");
            return Err(OAuthError::UserInfoFailed(describe_status(status)));
        }

        decode_body(response, OAuthError::UserInfoFailed).await
    }
}

fn describe_status(status: StatusCode) -> String {
    format!("HTTP {}", status.as_u16())
}

async fn decode_body<T, F>(response: reqwest::Response, on_error: F) -> Result<T, OAuthError>
where
    T: DeserializeOwned,
    F: FnOnce(String) -> OAuthError,
{
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| on_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::client.
    use std::collections::HashMap;

    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> OAuthClient {
        OAuthClient::new(AuthConfig::new(server.uri(), "test-client", "myapp://callback")).unwrap()
    }

    /// Validates the authorization URL carries every PKCE query parameter.
    ///
    /// Assertions:
    /// - Base is `issuer + authorize_path`.
    /// - Scope is space-joined and the challenge method is S256.
    /// - No `state` parameter is added.
    #[test]
    fn test_authorization_url_parameters() {
        let client = OAuthClient::new(AuthConfig::new(
            "https://auth.example.com",
            "test-client",
            "myapp://callback",
        ))
        .unwrap();
        let pkce = PKCEChallenge::generate();

        let url = client.authorization_url(&pkce).unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/api/oauth/authorize");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["client_id"], "test-client");
        assert_eq!(params["redirect_uri"], "myapp://callback");
        assert_eq!(params["scope"], "openid profile email");
        assert_eq!(params["code_challenge"], pkce.code_challenge);
        assert_eq!(params["code_challenge_method"], "S256");
        assert!(!params.contains_key("state"));
    }

    /// Validates an unusable issuer is a configuration error.
    #[test]
    fn test_authorization_url_invalid_issuer() {
        let client = OAuthClient::new(AuthConfig::new("::bad::", "c", "myapp://callback")).unwrap();
        let result = client.authorization_url(&PKCEChallenge::generate());
        assert_eq!(result.unwrap_err(), OAuthError::InvalidConfiguration);
    }

    /// Validates the code exchange sends a form body and decodes tokens.
    #[tokio::test]
    async fn test_exchange_code_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc"))
            .and(body_string_contains("code_verifier=verifier-1"))
            .and(body_string_contains("client_id=test-client"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = client_for(&server).exchange_code("abc", "verifier-1").await.unwrap();

        assert_eq!(tokens.access_token, "access-1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(tokens.expires_in, Some(3600));
    }

    /// Validates a non-200 exchange maps to `TokenExchangeFailed`.
    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).exchange_code("abc", "v").await.unwrap_err();
        assert_eq!(err, OAuthError::TokenExchangeFailed("HTTP 400".into()));
    }

    /// Validates a 200 with a non-token body maps to `InvalidResponse`.
    #[tokio::test]
    async fn test_exchange_code_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).exchange_code("abc", "v").await.unwrap_err();
        assert!(matches!(err, OAuthError::InvalidResponse(_)));
    }

    /// Validates the refresh grant body and non-200 handling.
    #[tokio::test]
    async fn test_refresh_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).refresh("refresh-1").await.unwrap_err();
        assert_eq!(err, OAuthError::TokenRefreshFailed("HTTP 401".into()));
        assert!(err.is_session_expired());
    }

    /// Validates the user-info request carries the bearer token.
    #[tokio::test]
    async fn test_fetch_user_info() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/oauth/userinfo"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": "u1",
                "name": "Ada",
                "picture": "https://x/p.png"
            })))
            .mount(&server)
            .await;

        let user = client_for(&server).fetch_user_info("access-1").await.unwrap();

        assert_eq!(user.id, "u1");
        assert_eq!(user.name.as_deref(), Some("Ada"));
        assert_eq!(user.image.as_deref(), Some("https://x/p.png"));
    }

    /// Validates user-info failures map to `UserInfoFailed`.
    #[tokio::test]
    async fn test_fetch_user_info_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/oauth/userinfo"))
            .and(header("authorization", "Bearer bad"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/oauth/userinfo"))
            .and(header("authorization", "Bearer anonymous"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "No Id"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.fetch_user_info("bad").await.unwrap_err();
        assert_eq!(err, OAuthError::UserInfoFailed("HTTP 403".into()));

        let err = client.fetch_user_info("anonymous").await.unwrap_err();
        assert!(matches!(err, OAuthError::UserInfoFailed(msg) if msg.contains("missing identifier")));
    }

    /// Validates the default constructor builds a usable client.
    #[test]
    fn test_new_builds_http_client() {
        let config = AuthConfig::new("https://auth.example.com", "c", "myapp://callback");
        let client = OAuthClient::new(config.clone()).expect("http client");
        assert_eq!(client.config(), &config);
    }

    /// Validates transport failures map to `NetworkError`.
    ///
    /// The issuer points at a port that was bound and released, so the
    /// connection is refused instead of answered.
    #[tokio::test]
    async fn test_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let issuer = format!("http://127.0.0.1:{port}");
        let client = OAuthClient::new(AuthConfig::new(issuer, "c", "myapp://callback")).unwrap();

        let err = client.refresh("r").await.unwrap_err();
        assert!(matches!(err, OAuthError::NetworkError(_)), "{err:?}");

        let err = client.exchange_code("code", "verifier").await.unwrap_err();
        assert!(matches!(err, OAuthError::NetworkError(_)), "{err:?}");
    }
}
