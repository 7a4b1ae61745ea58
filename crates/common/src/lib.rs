//! Client-side OAuth 2.0 session engine shared by RxAuth hosts.
//!
//! # Modules
//!
//! - [`auth`]: PKCE flow, token lifecycle, periodic refresh, session state
//! - [`security`]: OS secret store access
//! - [`testing`]: test doubles for hosts and integration tests
//! - [`utils`]: serde helpers

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod security;
pub mod testing;
pub mod utils;

pub use auth::{
    AuthConfig, AuthSessionEngine, AuthSnapshot, AuthenticationState, OAuthError, StorageError,
    TokenStorage, User,
};
pub use security::{KeychainError, KeychainProvider, SecretStore};
