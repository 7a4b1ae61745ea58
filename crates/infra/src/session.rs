//! Engine assembly from host configuration

use std::sync::Arc;

use rxauth_common::auth::{ExternalAuthenticator, SessionEventPublisher};
use rxauth_common::AuthSessionEngine;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::storage::build_token_storage;

/// Build an engine whose storage follows `config.storage`
///
/// The engine starts in the `Unknown` state; call
/// [`AuthSessionEngine::check_existing_auth`] to restore a session.
///
/// # Errors
/// Returns [`crate::InfraError::Auth`] if the engine's HTTP client cannot be
/// built
pub fn build_session_engine(
    config: &AppConfig,
    authenticator: Arc<dyn ExternalAuthenticator>,
    publisher: Arc<dyn SessionEventPublisher>,
) -> Result<AuthSessionEngine> {
    let storage = build_token_storage(&config.storage, &config.auth.storage_namespace);
    let engine = AuthSessionEngine::new(config.auth.clone(), storage, authenticator, publisher)?;
    Ok(engine)
}
