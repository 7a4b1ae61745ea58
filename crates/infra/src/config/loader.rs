//! Configuration loader
//!
//! Loads [`AppConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the process environment, if one exists
//! 2. Attempts to load from environment variables
//! 3. If a required variable is missing, falls back to a config file
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `RXAUTH_ISSUER`: Authorization server base URL
//! - `RXAUTH_CLIENT_ID`: Public client identifier
//! - `RXAUTH_REDIRECT_URI`: Callback URI registered with the provider
//!
//! Optional:
//! - `RXAUTH_SCOPES`: Space separated scopes
//! - `RXAUTH_AUTHORIZE_PATH`, `RXAUTH_TOKEN_PATH`, `RXAUTH_USERINFO_PATH`
//! - `RXAUTH_STORAGE_NAMESPACE`: Secret store service name
//! - `RXAUTH_REFRESH_INTERVAL_SECS`: Periodic refresh interval
//! - `RXAUTH_STORAGE`: `keychain` or `memory`
//! - `RXAUTH_RESET_AUTH`: Wipe persisted tokens at startup (true/false)
//! - `RXAUTH_LOG_LEVEL`: Default tracing filter
//! - `RXAUTH_LOG_FORMAT`: `compact`, `pretty` or `json`
//!
//! ## File Locations
//! The loader probes, in the current working directory:
//! `rxauth.toml`, `rxauth.json`, `config.toml`, `config.json`

use std::path::{Path, PathBuf};
use std::time::Duration;

use rxauth_common::AuthConfig;

use super::{AppConfig, LoggingSettings, StorageSettings};
use crate::errors::{InfraError, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["rxauth.toml", "rxauth.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns [`InfraError::Config`] if neither the environment nor any probed
/// file yields a valid configuration.
pub fn load() -> Result<AppConfig> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Failed to read .env file"),
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `RXAUTH_*` environment variables
///
/// # Errors
/// Returns [`InfraError::Config`] if a required variable is missing or an
/// optional one has an invalid value.
pub fn load_from_env() -> Result<AppConfig> {
    let mut auth = AuthConfig::new(
        env_var("RXAUTH_ISSUER")?,
        env_var("RXAUTH_CLIENT_ID")?,
        env_var("RXAUTH_REDIRECT_URI")?,
    );

    if let Some(scopes) = env_opt("RXAUTH_SCOPES") {
        auth = auth.with_scopes(scopes.split_whitespace());
    }
    if let Some(path) = env_opt("RXAUTH_AUTHORIZE_PATH") {
        auth.authorize_path = path;
    }
    if let Some(path) = env_opt("RXAUTH_TOKEN_PATH") {
        auth.token_path = path;
    }
    if let Some(path) = env_opt("RXAUTH_USERINFO_PATH") {
        auth.user_info_path = path;
    }
    if let Some(namespace) = env_opt("RXAUTH_STORAGE_NAMESPACE") {
        auth = auth.with_storage_namespace(namespace);
    }
    if let Some(secs) = env_opt("RXAUTH_REFRESH_INTERVAL_SECS") {
        let secs = secs
            .parse::<u64>()
            .map_err(|e| InfraError::Config(format!("Invalid refresh interval: {e}")))?;
        auth = auth.with_refresh_interval(Duration::from_secs(secs));
    }

    let mut storage = StorageSettings::default();
    if let Some(backend) = env_opt("RXAUTH_STORAGE") {
        storage.backend = backend.parse()?;
    }
    storage.reset_on_start = env_bool("RXAUTH_RESET_AUTH", false);

    let mut logging = LoggingSettings::default();
    if let Some(level) = env_opt("RXAUTH_LOG_LEVEL") {
        logging.level = level;
    }
    if let Some(format) = env_opt("RXAUTH_LOG_FORMAT") {
        logging.format = format.parse()?;
    }

    validate(AppConfig { auth, storage, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns [`InfraError::Config`] if the file is missing or malformed, and
/// [`InfraError::Io`] if it cannot be read.
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(InfraError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            InfraError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)?;
    parse_config(&contents, &config_path)
}

/// Format is chosen by extension; a path without one is read as JSON.
fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let config = match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| InfraError::Config(format!("Invalid TOML format: {e}")))?,
        "json" => serde_json::from_str(contents)
            .map_err(|e| InfraError::Config(format!("Invalid JSON format: {e}")))?,
        _ => return Err(InfraError::Config(format!("Unsupported config format: {extension}"))),
    };
    validate(config)
}

fn validate(config: AppConfig) -> Result<AppConfig> {
    if config.auth.refresh_interval.is_zero() {
        return Err(InfraError::Config("Refresh interval must be positive".to_string()));
    }
    if config.auth.token_url().is_none() {
        return Err(InfraError::Config(format!("Invalid issuer URL: {}", config.auth.issuer)));
    }
    Ok(config)
}

/// First existing config file in the current working directory
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    CONFIG_FILE_NAMES.iter().map(|name| cwd.join(name)).find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    env_opt(key)
        .ok_or_else(|| InfraError::Config(format!("Missing required environment variable: {key}")))
}

/// Set and non-blank
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Accepts `1`/`true`/`yes`/`on` (case-insensitive); anything else is false.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::Builder;

    use super::*;
    use crate::config::{LogFormat, StorageBackend};

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 13] = [
        "RXAUTH_ISSUER",
        "RXAUTH_CLIENT_ID",
        "RXAUTH_REDIRECT_URI",
        "RXAUTH_SCOPES",
        "RXAUTH_AUTHORIZE_PATH",
        "RXAUTH_TOKEN_PATH",
        "RXAUTH_USERINFO_PATH",
        "RXAUTH_STORAGE_NAMESPACE",
        "RXAUTH_REFRESH_INTERVAL_SECS",
        "RXAUTH_STORAGE",
        "RXAUTH_RESET_AUTH",
        "RXAUTH_LOG_LEVEL",
        "RXAUTH_LOG_FORMAT",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    fn set_required() {
        std::env::set_var("RXAUTH_ISSUER", "https://id.example.com");
        std::env::set_var("RXAUTH_CLIENT_ID", "desktop");
        std::env::set_var("RXAUTH_REDIRECT_URI", "myapp://callback");
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for value in ["1", "true", "yes", "on", "TRUE"] {
            std::env::set_var("RXAUTH_TEST_BOOL", value);
            assert!(env_bool("RXAUTH_TEST_BOOL", false), "{value} should be true");
        }
        for value in ["0", "false", "no", "off", "maybe"] {
            std::env::set_var("RXAUTH_TEST_BOOL", value);
            assert!(!env_bool("RXAUTH_TEST_BOOL", true), "{value} should be false");
        }

        std::env::remove_var("RXAUTH_TEST_BOOL");
        assert!(env_bool("RXAUTH_TEST_BOOL", true));
        assert!(!env_bool("RXAUTH_TEST_BOOL", false));
    }

    #[test]
    fn test_load_from_env_required_only() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();

        let config = load_from_env().expect("config from env");
        assert_eq!(config.auth.issuer, "https://id.example.com");
        assert_eq!(config.auth.client_id, "desktop");
        assert_eq!(config.auth.redirect_uri, "myapp://callback");
        assert_eq!(config.auth.scope_string(), "openid profile email");
        assert_eq!(config.auth.refresh_interval(), Duration::from_secs(300));
        assert_eq!(config.storage, StorageSettings::default());
        assert_eq!(config.logging, LoggingSettings::default());

        clear_env();
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();
        std::env::set_var("RXAUTH_SCOPES", "openid  offline_access");
        std::env::set_var("RXAUTH_AUTHORIZE_PATH", "/authorize");
        std::env::set_var("RXAUTH_TOKEN_PATH", "/token");
        std::env::set_var("RXAUTH_USERINFO_PATH", "/me");
        std::env::set_var("RXAUTH_STORAGE_NAMESPACE", "com.example.test");
        std::env::set_var("RXAUTH_REFRESH_INTERVAL_SECS", "60");
        std::env::set_var("RXAUTH_STORAGE", "memory");
        std::env::set_var("RXAUTH_RESET_AUTH", "yes");
        std::env::set_var("RXAUTH_LOG_LEVEL", "debug");
        std::env::set_var("RXAUTH_LOG_FORMAT", "json");

        let config = load_from_env().expect("config from env");
        assert_eq!(config.auth.scopes, vec!["openid", "offline_access"]);
        assert_eq!(config.auth.token_url().unwrap().as_str(), "https://id.example.com/token");
        assert_eq!(config.auth.user_info_url().unwrap().as_str(), "https://id.example.com/me");
        assert_eq!(
            config.auth.authorize_url().unwrap().as_str(),
            "https://id.example.com/authorize"
        );
        assert_eq!(config.auth.storage_namespace, "com.example.test");
        assert_eq!(config.auth.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.storage.reset_on_start);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("RXAUTH_ISSUER", "https://id.example.com");

        let err = load_from_env().unwrap_err();
        assert!(err.to_string().contains("RXAUTH_CLIENT_ID"), "{err}");

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_values() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        set_required();

        std::env::set_var("RXAUTH_REFRESH_INTERVAL_SECS", "soon");
        assert!(matches!(load_from_env(), Err(InfraError::Config(_))));

        std::env::set_var("RXAUTH_REFRESH_INTERVAL_SECS", "0");
        assert!(matches!(load_from_env(), Err(InfraError::Config(_))));

        std::env::remove_var("RXAUTH_REFRESH_INTERVAL_SECS");
        std::env::set_var("RXAUTH_STORAGE", "sqlite");
        assert!(matches!(load_from_env(), Err(InfraError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_load_from_file_toml() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[auth]
issuer = "https://id.example.com"
client_id = "desktop"
redirect_uri = "myapp://callback"
refresh_interval_secs = 120

[storage]
backend = "memory"

[logging]
format = "pretty"
"#
        )
        .unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.auth.refresh_interval(), Duration::from_secs(120));
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(!config.storage.reset_on_start);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_load_from_file_json() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "auth": {{
                    "issuer": "https://id.example.com",
                    "client_id": "desktop",
                    "redirect_uri": "myapp://callback",
                    "scopes": ["openid"]
                }},
                "storage": {{ "reset_on_start": true }}
            }}"#
        )
        .unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.auth.scope_string(), "openid");
        assert_eq!(config.storage.backend, StorageBackend::Keychain);
        assert!(config.storage.reset_on_start);
    }

    #[test]
    fn test_load_from_file_errors() {
        let missing = load_from_file(Some(PathBuf::from("/nonexistent/rxauth.toml"))).unwrap_err();
        assert!(missing.to_string().contains("Config file not found"));

        let mut bad = Builder::new().suffix(".toml").tempfile().unwrap();
        write!(bad, "[auth]\nissuer = ").unwrap();
        let err = load_from_file(Some(bad.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("Invalid TOML format"));

        let mut yaml = Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(yaml, "auth: {{}}").unwrap();
        let err = load_from_file(Some(yaml.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("Unsupported config format: yaml"));
    }

    #[test]
    fn test_parse_config_rejects_unusable_values() {
        let zero = r#"{"auth": {"issuer": "https://id.example.com", "client_id": "a",
            "redirect_uri": "myapp://cb", "refresh_interval_secs": 0}}"#;
        let err = parse_config(zero, Path::new("c.json")).unwrap_err();
        assert!(err.to_string().contains("Refresh interval"));

        let relative = r#"{"auth": {"issuer": "not a url", "client_id": "a",
            "redirect_uri": "myapp://cb"}}"#;
        let err = parse_config(relative, Path::new("c.json")).unwrap_err();
        assert!(err.to_string().contains("Invalid issuer URL"));
    }

    #[test]
    fn test_parse_config_missing_auth_fields() {
        let err = parse_config(r#"{"auth": {"issuer": "x"}}"#, Path::new("c.json")).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON format"));
    }
}
