//! Testing utilities for hosts and integration tests
//!
//! - **[`mocks`]**: Test doubles for the secret store, the interactive
//!   authenticator and the session event publisher
//!
//! ## Usage
//!
//! ```rust
//! use rxauth_common::testing::{MockAuthenticator, RecordingPublisher};
//!
//! let authenticator = MockAuthenticator::redirecting_to("myapp://callback?code=abc");
//! let publisher = RecordingPublisher::new();
//! assert_eq!(authenticator.call_count(), 0);
//! assert!(publisher.events().is_empty());
//! ```

pub mod mocks;

pub use mocks::{MockAuthenticator, MockKeychainProvider, RecordingPublisher};
