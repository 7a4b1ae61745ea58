//! Authentication session engine
//!
//! Owns the observable session state and drives every transition:
//!
//! ```text
//!            check_existing_auth / authenticate / refresh
//! Unknown ─────────────────────────────────────────────► Authenticated
//!    │                                                     │      ▲
//!    │ no session / restore failed      logout / rejected  │      │ authenticate
//!    ▼                                  refresh token      ▼      │
//! Unauthenticated ◄──────────────────────────────────────────────┘
//! ```
//!
//! Public operations are serialized by an internal flow lock; a caller that
//! arrives while another operation is in flight waits for it. The periodic
//! refresh never waits: it skips a tick when the lock is taken.

use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};
use url::Url;

use super::authenticator::ExternalAuthenticator;
use super::client::OAuthClient;
use super::config::AuthConfig;
use super::error::OAuthError;
use super::events::{SessionEvent, SessionEventPublisher};
use super::keychain_storage::KeychainTokenStorage;
use super::pkce::PKCEChallenge;
use super::refresh::RefreshScheduler;
use super::storage::TokenStorage;
use super::types::{AuthSnapshot, AuthenticationState, TokenResponse, User};

/// OAuth 2.0 authorization-code + PKCE session engine
///
/// Cheap to clone; all clones share one session. Dropping the last clone
/// stops the periodic refresh.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use rxauth_common::auth::{
///     AuthConfig, AuthSessionEngine, BroadcastEventBus, InMemoryTokenStorage,
/// };
/// use rxauth_common::testing::MockAuthenticator;
///
/// # async fn example() -> Result<(), rxauth_common::auth::OAuthError> {
/// let config = AuthConfig::new("https://auth.example.com", "client", "myapp://callback");
/// let engine = AuthSessionEngine::new(
///     config,
///     Arc::new(InMemoryTokenStorage::new()),
///     Arc::new(MockAuthenticator::redirecting_to("myapp://callback?code=abc")),
///     Arc::new(BroadcastEventBus::new()),
/// )?;
///
/// engine.check_existing_auth().await;
/// if !engine.auth_state().is_authenticated() {
///     engine.authenticate().await?;
/// }
/// let bearer = engine.access_token().await?;
/// # let _ = bearer;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthSessionEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    client: OAuthClient,
    storage: Arc<dyn TokenStorage>,
    authenticator: Arc<dyn ExternalAuthenticator>,
    publisher: Arc<dyn SessionEventPublisher>,
    state: watch::Sender<AuthSnapshot>,
    flow: Mutex<()>,
    refresh: RefreshScheduler,
}

impl AuthSessionEngine {
    /// Create an engine in the `Unknown` state
    ///
    /// # Errors
    /// Returns `OAuthError::NetworkError` if the HTTP client cannot be built
    pub fn new(
        config: AuthConfig,
        storage: Arc<dyn TokenStorage>,
        authenticator: Arc<dyn ExternalAuthenticator>,
        publisher: Arc<dyn SessionEventPublisher>,
    ) -> Result<Self, OAuthError> {
        Ok(Self::with_client(OAuthClient::new(config)?, storage, authenticator, publisher))
    }

    /// Create an engine that keeps its session in the platform keychain
    /// under the configured storage namespace
    ///
    /// # Errors
    /// Returns `OAuthError::NetworkError` if the HTTP client cannot be built
    pub fn with_keychain(
        config: AuthConfig,
        authenticator: Arc<dyn ExternalAuthenticator>,
        publisher: Arc<dyn SessionEventPublisher>,
    ) -> Result<Self, OAuthError> {
        let storage = Arc::new(KeychainTokenStorage::new(config.storage_namespace.clone()));
        Self::new(config, storage, authenticator, publisher)
    }

    /// Create an engine around a preconfigured HTTP client
    pub fn with_client(
        client: OAuthClient,
        storage: Arc<dyn TokenStorage>,
        authenticator: Arc<dyn ExternalAuthenticator>,
        publisher: Arc<dyn SessionEventPublisher>,
    ) -> Self {
        let refresh = RefreshScheduler::new(client.config().refresh_interval());
        let (state, _) = watch::channel(AuthSnapshot::default());

        Self {
            inner: Arc::new(EngineInner {
                client,
                storage,
                authenticator,
                publisher,
                state,
                flow: Mutex::new(()),
                refresh,
            }),
        }
    }

    /// Restore a stored session on startup
    ///
    /// Never fails: every problem ends in `Unauthenticated` and is logged.
    pub async fn check_existing_auth(&self) {
        let _flow = self.inner.flow.lock().await;
        self.inner.restore().await;
    }

    /// Run the interactive authorization-code + PKCE flow
    ///
    /// On failure the state is left as it was and, unless the user
    /// cancelled, the message is recorded in `error_message`.
    ///
    /// # Errors
    /// - `OAuthError::InvalidConfiguration` if the authorize URL or the
    ///   redirect scheme cannot be derived
    /// - `OAuthError::Cancelled` / `AuthenticationFailed` from the
    ///   authenticator
    /// - `OAuthError::InvalidCallbackURL` if the callback carries no code
    /// - `OAuthError::TokenExchangeFailed`, `NetworkError`,
    ///   `InvalidResponse`, `Storage` or `UserInfoFailed` from the
    ///   exchange and profile fetch
    pub async fn authenticate(&self) -> Result<(), OAuthError> {
        let _flow = self.inner.flow.lock().await;
        let _authenticating = AuthenticatingGuard::begin(&self.inner.state);

        let result = self.inner.authorize().await;
        match &result {
            Ok(()) => info!("Authentication completed"),
            Err(OAuthError::Cancelled) => info!("Authentication cancelled by user"),
            Err(err) => {
                warn!(error = %err, "Authentication failed");
                self.inner.state.send_modify(|s| s.error_message = Some(err.to_string()));
            }
        }
        result
    }

    /// End the session; always succeeds
    ///
    /// Storage failures are logged, not returned.
    pub async fn logout(&self) {
        let _flow = self.inner.flow.lock().await;
        self.inner.logout_locked();
    }

    /// Exchange the stored refresh token for a new access token
    ///
    /// A rejected refresh token ends the session and publishes
    /// [`SessionEvent::SessionExpired`] before the error is returned.
    ///
    /// # Errors
    /// - `OAuthError::NoRefreshToken` if none is stored
    /// - `OAuthError::InvalidConfiguration` if the token URL cannot be
    ///   derived
    /// - `OAuthError::TokenRefreshFailed` on a non-200 response
    /// - `OAuthError::NetworkError`, `InvalidResponse`, `Storage` or
    ///   `UserInfoFailed` otherwise
    pub async fn refresh_token_if_needed(&self) -> Result<(), OAuthError> {
        let _flow = self.inner.flow.lock().await;
        self.inner.refresh_locked().await
    }

    /// Return a usable bearer token, refreshing first if the stored one is
    /// expired or missing
    ///
    /// # Errors
    /// Same as [`Self::refresh_token_if_needed`] when a refresh is needed
    pub async fn access_token(&self) -> Result<String, OAuthError> {
        let _flow = self.inner.flow.lock().await;
        let storage = &self.inner.storage;

        if !storage.is_expired() {
            if let Some(token) = storage.get_access_token() {
                return Ok(token);
            }
        }

        debug!("Stored access token unusable; refreshing before use");
        self.inner.refresh_locked().await?;
        storage.get_access_token().ok_or_else(|| {
            OAuthError::InvalidResponse("no access token stored after refresh".to_string())
        })
    }

    /// Watch every state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.inner.state.subscribe()
    }

    /// Current state, user, error and in-progress flag
    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Current authentication state
    #[must_use]
    pub fn auth_state(&self) -> AuthenticationState {
        self.inner.state.borrow().state
    }

    /// Profile of the signed-in user
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    /// Last authentication failure message
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.inner.state.borrow().error_message.clone()
    }

    /// True while `authenticate` is running
    #[must_use]
    pub fn is_authenticating(&self) -> bool {
        self.inner.state.borrow().is_authenticating
    }

    /// Forget the last failure message
    pub fn clear_error(&self) {
        self.inner.state.send_if_modified(|s| s.error_message.take().is_some());
    }

    /// True while the periodic refresh task is live
    #[must_use]
    pub fn is_refresh_armed(&self) -> bool {
        self.inner.refresh.is_armed()
    }

    /// Configuration the engine was built with
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        self.inner.client.config()
    }

    /// Token storage backing the session
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn TokenStorage> {
        &self.inner.storage
    }
}

impl EngineInner {
    async fn restore(self: &Arc<Self>) {
        if self.storage.get_access_token().is_some() && !self.storage.is_expired() {
            match self.load_user().await {
                Ok(user) => {
                    info!(user_id = %user.id, "Restored stored session");
                    self.mark_authenticated(user);
                }
                Err(err) => {
                    warn!(error = %err, "Stored session could not be validated");
                    self.mark_unauthenticated();
                }
            }
        } else if self.storage.get_refresh_token().is_some() {
            debug!("Stored access token expired; attempting refresh");
            if let Err(err) = self.refresh_locked().await {
                warn!(error = %err, "Session restore refresh failed");
                self.mark_unauthenticated();
            }
        } else {
            info!("No stored session");
            self.mark_unauthenticated();
        }
    }

    async fn authorize(self: &Arc<Self>) -> Result<(), OAuthError> {
        let pkce = PKCEChallenge::generate();
        let authorization_url = self.client.authorization_url(&pkce)?;
        let callback_scheme =
            self.client.config().redirect_scheme().ok_or(OAuthError::InvalidConfiguration)?;

        debug!(scheme = %callback_scheme, "Presenting authorization page");
        let callback = self.authenticator.authenticate(&authorization_url, &callback_scheme).await?;
        let code = extract_code(&callback)?;

        let tokens = self.client.exchange_code(&code, &pkce.code_verifier).await?;
        self.persist_tokens(&tokens)?;

        let user = self.load_user().await?;
        self.mark_authenticated(user);
        Ok(())
    }

    async fn refresh_locked(self: &Arc<Self>) -> Result<(), OAuthError> {
        let refresh_token = self.storage.get_refresh_token().ok_or(OAuthError::NoRefreshToken)?;

        let tokens = match self.client.refresh(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(err) if err.is_session_expired() => {
                warn!(error = %err, "Refresh token rejected; ending session");
                self.logout_locked();
                self.publisher.publish(SessionEvent::SessionExpired);
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        self.persist_tokens(&tokens)?;
        let user = self.load_user().await?;
        info!(user_id = %user.id, "Access token refreshed");
        self.mark_authenticated(user);
        Ok(())
    }

    fn logout_locked(&self) {
        self.refresh.disarm();
        if let Err(err) = self.storage.clear_all() {
            error!(error = %err, "Failed to clear stored session");
        }
        self.state.send_modify(|s| {
            s.state = AuthenticationState::Unauthenticated;
            s.user = None;
        });
        info!("Logged out");
    }

    /// Access token always, refresh token only when issued, expiry only when
    /// `expires_in` is present
    fn persist_tokens(&self, tokens: &TokenResponse) -> Result<(), OAuthError> {
        self.storage.save_access_token(&tokens.access_token)?;

        if let Some(refresh_token) = &tokens.refresh_token {
            self.storage.save_refresh_token(refresh_token)?;
        }

        if let Some(expires_in) = tokens.expires_in {
            match TimeDelta::try_seconds(expires_in).and_then(|ttl| Utc::now().checked_add_signed(ttl))
            {
                Some(expires_at) => self.storage.save_expires_at(expires_at)?,
                None => warn!(expires_in, "Ignoring out-of-range token lifetime"),
            }
        }

        Ok(())
    }

    async fn load_user(&self) -> Result<User, OAuthError> {
        let access_token = self.storage.get_access_token().ok_or(OAuthError::InvalidURL)?;
        self.client.fetch_user_info(&access_token).await
    }

    fn mark_authenticated(self: &Arc<Self>, user: User) {
        self.state.send_modify(|s| {
            s.state = AuthenticationState::Authenticated;
            s.user = Some(user);
        });
        self.arm_refresh();
    }

    fn mark_unauthenticated(&self) {
        self.refresh.disarm();
        self.state.send_modify(|s| {
            s.state = AuthenticationState::Unauthenticated;
            s.user = None;
        });
    }

    fn arm_refresh(self: &Arc<Self>) {
        let engine = Arc::downgrade(self);
        self.refresh.arm(move || {
            let engine = engine.clone();
            async move {
                let Some(engine) = engine.upgrade() else {
                    return ControlFlow::Break(());
                };
                engine.refresh_tick().await;
                ControlFlow::Continue(())
            }
        });
    }

    async fn refresh_tick(self: &Arc<Self>) {
        let Ok(_flow) = self.flow.try_lock() else {
            debug!("Skipping periodic refresh; another operation is in flight");
            return;
        };

        debug!("Periodic refresh tick");
        if let Err(err) = self.refresh_locked().await {
            warn!(error = %err, "Periodic refresh failed");
        }
    }
}

/// Pull a non-empty `code` query parameter out of a callback URL
fn extract_code(callback: &str) -> Result<String, OAuthError> {
    let url = Url::parse(callback).map_err(|_| OAuthError::InvalidCallbackURL)?;
    url.query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
        .ok_or(OAuthError::InvalidCallbackURL)
}

/// Holds `is_authenticating` true until dropped, on every exit path
struct AuthenticatingGuard<'a> {
    state: &'a watch::Sender<AuthSnapshot>,
}

impl<'a> AuthenticatingGuard<'a> {
    fn begin(state: &'a watch::Sender<AuthSnapshot>) -> Self {
        state.send_modify(|s| {
            s.is_authenticating = true;
            s.error_message = None;
        });
        Self { state }
    }
}

impl Drop for AuthenticatingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.is_authenticating = false);
    }
}

impl std::fmt::Debug for AuthSessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSessionEngine")
            .field("issuer", &self.config().issuer)
            .field("snapshot", &*self.inner.state.borrow())
            .field("refresh", &self.inner.refresh)
            .finish_non_exhaustive()
    }
}
