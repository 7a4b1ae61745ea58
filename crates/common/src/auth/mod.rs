//! OAuth 2.0 Authorization Code + PKCE session management
//!
//! Drives a user through an external authorization step, exchanges the code
//! for tokens, keeps them in pluggable secure storage, refreshes them on a
//! timer, and publishes an observable session state.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐
//! │ AuthSessionEngine │  State machine + observable snapshot
//! └─────────┬─────────┘
//!           │
//!           ├──► OAuthClient             (authorize URL, exchange, refresh, user info)
//!           ├──► ExternalAuthenticator   (host-supplied browser / web view)
//!           ├──► TokenStorage            (in-memory or keychain-backed)
//!           ├──► RefreshScheduler        (periodic refresh task)
//!           └──► SessionEventPublisher   (session-expired broadcast)
//! ```
//!
//! # Module Organization
//!
//! - **[`config`]**: Authorization server configuration and derived URLs
//! - **[`pkce`]**: Verifier and S256 challenge generation
//! - **[`types`]**: Session state, user profile, token payloads
//! - **[`storage`]**: Token storage contract and expiry margin
//! - **[`memory_storage`]** / **[`keychain_storage`]**: Storage backends
//! - **[`client`]**: HTTP calls to the authorization server
//! - **[`engine`]**: The session state machine
//!
//! # Security Notes
//!
//! - No client secret: PKCE binds the code to this client instance
//! - No `state` parameter is sent; PKCE is the only binding
//! - Tokens, codes and verifiers are never logged

pub mod authenticator;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod keychain_storage;
pub mod memory_storage;
pub mod pkce;
pub mod refresh;
pub mod storage;
pub mod types;

pub use authenticator::ExternalAuthenticator;
pub use client::OAuthClient;
pub use config::AuthConfig;
pub use engine::AuthSessionEngine;
pub use error::OAuthError;
pub use events::{BroadcastEventBus, NoopPublisher, SessionEvent, SessionEventPublisher};
pub use keychain_storage::KeychainTokenStorage;
pub use memory_storage::InMemoryTokenStorage;
pub use pkce::{generate_code_challenge, generate_code_verifier, PKCEChallenge};
pub use refresh::RefreshScheduler;
pub use storage::{StorageError, TokenStorage, EXPIRY_MARGIN_SECONDS};
pub use types::{AuthSnapshot, AuthenticationState, TokenResponse, User, UserDecodeError};
