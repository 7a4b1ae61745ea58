//! # RxAuth Infrastructure
//!
//! Host-side wiring around the `rxauth-common` session engine.
//!
//! This crate contains:
//! - Configuration loading (environment, `.env`, TOML/JSON files)
//! - Tracing subscriber initialisation
//! - Token storage backend selection, including the "reset auth" launch mode
//! - A one-call engine builder combining the above
//!
//! ## Architecture
//! - Depends on `rxauth-common` only
//! - Contains the process-level concerns the engine does not own (env, files,
//!   global subscriber)

pub mod config;
pub mod errors;
pub mod observability;
pub mod session;
pub mod storage;

pub use config::{AppConfig, LogFormat, LoggingSettings, StorageBackend, StorageSettings};
pub use errors::{InfraError, Result};
pub use observability::init_tracing;
pub use session::build_session_engine;
pub use storage::{build_token_storage, build_token_storage_with};
