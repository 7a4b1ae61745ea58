//! Test doubles for the engine's collaborators
//!
//! None of these touch the OS keychain, a browser or the network.

#![allow(clippy::missing_errors_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use crate::auth::{ExternalAuthenticator, OAuthError, SessionEvent, SessionEventPublisher};
use crate::security::{KeychainError, SecretStore};

type StorageData = Arc<Mutex<HashMap<String, String>>>;
type RequestLog = Arc<Mutex<Vec<(Url, String)>>>;

/// In-memory [`SecretStore`] with failure injection
///
/// # Examples
///
/// ```
/// use rxauth_common::security::SecretStore;
/// use rxauth_common::testing::MockKeychainProvider;
///
/// let keychain = MockKeychainProvider::new("rxauth-test");
/// keychain.set_secret("key", "value").unwrap();
/// assert_eq!(keychain.get_secret("key").unwrap(), "value");
/// ```
#[derive(Debug, Clone)]
pub struct MockKeychainProvider {
    storage: StorageData,
    service_name: String,
    fail_writes: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

impl MockKeychainProvider {
    /// Create an empty mock keychain namespaced by `service_name`
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            storage: Arc::new(Mutex::new(HashMap::new())),
            service_name: service_name.into(),
            fail_writes: Arc::new(AtomicBool::new(false)),
            fail_deletes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Service name this mock stands in for
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Make every subsequent `set_secret` fail (or succeed again)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `delete_secret` fail (or succeed again)
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Number of secrets currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.lock().len()
    }

    /// True when no secrets are held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.lock().is_empty()
    }
}

impl Default for MockKeychainProvider {
    fn default() -> Self {
        Self::new("rxauth-test")
    }
}

impl SecretStore for MockKeychainProvider {
    fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KeychainError::AccessFailed(format!("write to {key} rejected")));
        }
        self.storage.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        self.storage.lock().get(key).cloned().ok_or(KeychainError::NotFound)
    }

    fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(KeychainError::AccessFailed(format!("delete of {key} rejected")));
        }
        self.storage.lock().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum AuthOutcome {
    Redirect(String),
    Cancel,
    Fail(String),
    NoCallback,
}

/// Scripted [`ExternalAuthenticator`]
///
/// Records every authorization URL and callback scheme it is handed.
#[derive(Debug, Clone)]
pub struct MockAuthenticator {
    outcome: Arc<Mutex<AuthOutcome>>,
    requests: RequestLog,
    delay: Option<Duration>,
}

impl MockAuthenticator {
    fn with_outcome(outcome: AuthOutcome) -> Self {
        Self { outcome: Arc::new(Mutex::new(outcome)), requests: Arc::default(), delay: None }
    }

    /// Complete every attempt by redirecting to `callback`
    pub fn redirecting_to(callback: impl Into<String>) -> Self {
        Self::with_outcome(AuthOutcome::Redirect(callback.into()))
    }

    /// Report that the user dismissed the flow
    #[must_use]
    pub fn cancelling() -> Self {
        Self::with_outcome(AuthOutcome::Cancel)
    }

    /// Fail with `AuthenticationFailed(detail)`
    pub fn failing(detail: impl Into<String>) -> Self {
        Self::with_outcome(AuthOutcome::Fail(detail.into()))
    }

    /// Finish without producing a callback URL
    #[must_use]
    pub fn without_callback() -> Self {
        Self::with_outcome(AuthOutcome::NoCallback)
    }

    /// Sleep this long before answering, simulating a user at the browser
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Redirect subsequent attempts to `callback`
    pub fn set_redirect(&self, callback: impl Into<String>) {
        *self.outcome.lock() = AuthOutcome::Redirect(callback.into());
    }

    /// Number of attempts presented so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Authorization URL and callback scheme of the latest attempt
    #[must_use]
    pub fn last_request(&self) -> Option<(Url, String)> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl ExternalAuthenticator for MockAuthenticator {
    async fn authenticate(
        &self,
        authorization_url: &Url,
        callback_scheme: &str,
    ) -> Result<String, OAuthError> {
        self.requests.lock().push((authorization_url.clone(), callback_scheme.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.outcome.lock().clone();
        match outcome {
            AuthOutcome::Redirect(callback) => Ok(callback),
            AuthOutcome::Cancel => Err(OAuthError::Cancelled),
            AuthOutcome::Fail(detail) => Err(OAuthError::AuthenticationFailed(detail)),
            AuthOutcome::NoCallback => Err(OAuthError::InvalidCallbackURL),
        }
    }
}

/// [`SessionEventPublisher`] that remembers what it was given
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl RecordingPublisher {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event published so far, oldest first
    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    /// Number of times `event` was published
    #[must_use]
    pub fn count(&self, event: SessionEvent) -> usize {
        self.events.lock().iter().filter(|e| **e == event).count()
    }
}

impl SessionEventPublisher for RecordingPublisher {
    fn publish(&self, event: SessionEvent) {
        self.events.lock().push(event);
    }
}
