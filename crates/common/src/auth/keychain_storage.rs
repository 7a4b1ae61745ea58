//! Persistent token storage layered on the OS keychain
//!
//! # Module Layering
//!
//! - **`security::keychain`**: generic secret storage keyed by account name
//! - **`auth::keychain_storage`** (this module): the three session slots on
//!   top of it, with expiry stored as unix seconds

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::storage::{StorageError, TokenStorage};
use crate::security::{KeychainError, KeychainProvider, SecretStore};

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const EXPIRES_AT_KEY: &str = "expires_at";

/// [`TokenStorage`] backed by a [`SecretStore`], the platform keychain by
/// default
///
/// Each slot operation holds an internal lock so reads never interleave
/// with a write or delete on the same instance.
pub struct KeychainTokenStorage<S: SecretStore = KeychainProvider> {
    store: S,
    op_lock: Mutex<()>,
}

impl KeychainTokenStorage<KeychainProvider> {
    /// Store the session in the platform keychain under `namespace`
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_store(KeychainProvider::new(namespace))
    }
}

impl<S: SecretStore> KeychainTokenStorage<S> {
    /// Store the session in an arbitrary secret store
    pub fn with_store(store: S) -> Self {
        Self { store, op_lock: Mutex::new(()) }
    }

    /// Underlying secret store
    pub fn store(&self) -> &S {
        &self.store
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.op_lock.lock();
        self.store.set_secret(key, value).map_err(|e| StorageError::SaveFailed(e.to_string()))
    }

    fn read(&self, key: &str) -> Option<String> {
        let _guard = self.op_lock.lock();
        match self.store.get_secret(key) {
            Ok(value) => Some(value),
            Err(KeychainError::NotFound) => None,
            Err(err) => {
                warn!(key = %key, error = %err, "Keychain read failed; treating slot as empty");
                None
            }
        }
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.op_lock.lock();
        self.store.delete_secret(key).map_err(|e| StorageError::DeleteFailed(e.to_string()))
    }
}

impl<S: SecretStore> TokenStorage for KeychainTokenStorage<S> {
    fn save_access_token(&self, token: &str) -> Result<(), StorageError> {
        self.save(ACCESS_TOKEN_KEY, token)
    }

    fn get_access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    fn delete_access_token(&self) -> Result<(), StorageError> {
        self.delete(ACCESS_TOKEN_KEY)
    }

    fn save_refresh_token(&self, token: &str) -> Result<(), StorageError> {
        self.save(REFRESH_TOKEN_KEY, token)
    }

    fn get_refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    fn delete_refresh_token(&self) -> Result<(), StorageError> {
        self.delete(REFRESH_TOKEN_KEY)
    }

    fn save_expires_at(&self, expires_at: DateTime<Utc>) -> Result<(), StorageError> {
        self.save(EXPIRES_AT_KEY, &expires_at.timestamp().to_string())
    }

    fn get_expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.read(EXPIRES_AT_KEY)?;
        match parse_timestamp(&raw) {
            Ok(expires_at) => Some(expires_at),
            Err(err) => {
                warn!(error = %err, "Stored expiry is unreadable; treating session as expired");
                None
            }
        }
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        debug!("Clearing keychain session slots");

        let results = [
            self.delete(ACCESS_TOKEN_KEY),
            self.delete(REFRESH_TOKEN_KEY),
            self.delete(EXPIRES_AT_KEY),
        ];
        results.into_iter().collect()
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    let seconds: i64 = raw
        .trim()
        .parse()
        .map_err(|_| StorageError::UnexpectedDataFormat(format!("expiry `{raw}` is not an integer")))?;
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| StorageError::UnexpectedDataFormat(format!("expiry {seconds} out of range")))
}

impl<S: SecretStore> std::fmt::Debug for KeychainTokenStorage<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeychainTokenStorage").finish_non_exhaustive()
    }
}
