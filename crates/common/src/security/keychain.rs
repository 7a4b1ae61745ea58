//! Generic keychain provider for secure credential storage
//!
//! Thin wrapper over the platform keychain (macOS Keychain Access, Windows
//! Credential Manager, Linux Secret Service) via the `keyring` crate.
//!
//! ## Module Relationships
//!
//! - This module: generic secret storage keyed by (service, account)
//! - `auth::keychain_storage`: session token slots layered on top
//!
//! ## Usage
//!
//! ```no_run
//! use rxauth_common::security::{KeychainProvider, SecretStore};
//!
//! let keychain = KeychainProvider::new("com.rxauth.session");
//! keychain.set_secret("service_account", "super-secret")?;
//! let secret = keychain.get_secret("service_account")?;
//! assert_eq!(secret, "super-secret");
//! # Ok::<(), rxauth_common::security::KeychainError>(())
//! ```

use keyring::Entry;
use thiserror::Error;
use tracing::debug;

/// Raw secret persistence keyed by account name within one service
///
/// Implemented by [`KeychainProvider`] for production and by
/// `testing::MockKeychainProvider` for tests.
pub trait SecretStore: Send + Sync {
    /// Store a secret, replacing any previous value
    ///
    /// # Errors
    /// Returns `KeychainError::Keyring` (or `AccessFailed` for non-keyring
    /// stores) if the store rejects the write
    fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError>;

    /// Retrieve a secret
    ///
    /// # Errors
    /// Returns `KeychainError::NotFound` if no secret exists for `key`, and
    /// `Keyring` / `AccessFailed` if the store cannot be read
    fn get_secret(&self, key: &str) -> Result<String, KeychainError>;

    /// Delete a secret (idempotent)
    ///
    /// # Errors
    /// Returns `KeychainError::Keyring` (or `AccessFailed` for non-keyring
    /// stores) if the store rejects the delete
    fn delete_secret(&self, key: &str) -> Result<(), KeychainError>;

    /// Check whether a secret exists
    fn secret_exists(&self, key: &str) -> bool {
        self.get_secret(key).is_ok()
    }
}

/// Platform keychain provider scoped to one service name
#[derive(Debug, Clone)]
pub struct KeychainProvider {
    service_name: String,
}

impl KeychainProvider {
    /// Create a new keychain provider for a specific service
    ///
    /// # Examples
    /// ```
    /// use rxauth_common::security::KeychainProvider;
    ///
    /// let keychain = KeychainProvider::new("com.rxauth.session");
    /// assert_eq!(keychain.service_name(), "com.rxauth.session");
    /// ```
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    /// Service name every entry is filed under
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn create_entry(&self, account: &str) -> Result<Entry, KeychainError> {
        Ok(Entry::new(&self.service_name, account)?)
    }
}

impl SecretStore for KeychainProvider {
    fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Storing secret in keychain");

        let entry = self.create_entry(key)?;
        entry.set_password(value)?;

        Ok(())
    }

    fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        debug!(service = %self.service_name, key = %key, "Retrieving secret from keychain");

        let entry = self.create_entry(key)?;
        entry.get_password().map_err(read_error)
    }

    fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Deleting secret from keychain");

        let entry = self.create_entry(key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A missing entry is `NotFound`; everything else stays a keyring error.
fn read_error(err: keyring::Error) -> KeychainError {
    match err {
        keyring::Error::NoEntry => KeychainError::NotFound,
        other => KeychainError::Keyring(other),
    }
}

/// Keychain error types
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Store rejected the operation (non-keyring stores)
    #[error("Keychain access failed: {0}")]
    AccessFailed(String),

    /// Entry not found in keychain
    #[error("Entry not found")]
    NotFound,

    /// Underlying keyring library error
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}
