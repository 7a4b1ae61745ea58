//! Token storage backend selection
//!
//! Chooses the [`TokenStorage`] the engine runs on. With
//! `reset_on_start` the persisted session is wiped first and the process
//! runs on an in-memory backend, so UI tests always start signed out.

use std::sync::Arc;

use rxauth_common::auth::{InMemoryTokenStorage, KeychainTokenStorage};
use rxauth_common::{KeychainProvider, SecretStore, TokenStorage};
use tracing::{info, warn};

use crate::config::{StorageBackend, StorageSettings};

/// Build the storage backend for `namespace` using the OS secret store
pub fn build_token_storage(settings: &StorageSettings, namespace: &str) -> Arc<dyn TokenStorage> {
    build_token_storage_with(settings, KeychainProvider::new(namespace))
}

/// Build the storage backend on top of an explicit secret store
pub fn build_token_storage_with<S>(settings: &StorageSettings, store: S) -> Arc<dyn TokenStorage>
where
    S: SecretStore + 'static,
{
    if settings.reset_on_start {
        let persistent = KeychainTokenStorage::with_store(store);
        match persistent.clear_all() {
            Ok(()) => info!("Persisted session cleared for reset launch"),
            Err(e) => warn!(error = %e, "Failed to clear persisted session on reset"),
        }
        return Arc::new(InMemoryTokenStorage::new());
    }

    match settings.backend {
        StorageBackend::Keychain => Arc::new(KeychainTokenStorage::with_store(store)),
        StorageBackend::Memory => Arc::new(InMemoryTokenStorage::new()),
    }
}
