//! Security primitives
//!
//! OS-backed secret storage used by the persistent token storage.

pub mod keychain;

pub use keychain::{KeychainError, KeychainProvider, SecretStore};
