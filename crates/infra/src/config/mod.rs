//! Host configuration
//!
//! [`AppConfig`] bundles the engine's [`AuthConfig`] with the settings the
//! host applies around it: which token storage backend to use and how to
//! log. See [`loader`] for the sources it is read from.

pub mod loader;

use std::fmt;
use std::str::FromStr;

use rxauth_common::AuthConfig;
use serde::{Deserialize, Serialize};

use crate::errors::InfraError;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};

/// Complete host configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// OAuth provider and engine settings
    pub auth: AuthConfig,

    /// Token storage backend selection
    #[serde(default)]
    pub storage: StorageSettings,

    /// Tracing subscriber settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Wrap an [`AuthConfig`] with default storage and logging settings
    pub fn new(auth: AuthConfig) -> Self {
        Self { auth, storage: StorageSettings::default(), logging: LoggingSettings::default() }
    }
}

/// Where tokens are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// OS secret store
    #[default]
    Keychain,
    /// Process memory only
    Memory,
}

impl FromStr for StorageBackend {
    type Err = InfraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keychain" => Ok(Self::Keychain),
            "memory" => Ok(Self::Memory),
            other => Err(InfraError::Config(format!("Unknown storage backend: {other}"))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keychain => f.write_str("keychain"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// Token storage settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Backend used for the session
    pub backend: StorageBackend,

    /// Wipe persisted tokens at startup and run on an in-memory backend
    pub reset_on_start: bool,
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human readable output
    #[default]
    Compact,
    /// Multi-line human readable output
    Pretty,
    /// Newline-delimited JSON
    Json,
}

impl FromStr for LogFormat {
    type Err = InfraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(InfraError::Config(format!("Unknown log format: {other}"))),
        }
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` overrides it
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::default() }
    }
}
