//! Tracing subscriber setup
//!
//! Installs a global `tracing-subscriber` fmt subscriber writing to stderr.
//! `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingSettings};

/// Filter used when neither `RUST_LOG` nor the configured level parses
const FALLBACK_FILTER: &str = "info";

/// Install the global subscriber
///
/// Returns `false` when a global subscriber was already set, in which case
/// nothing changes.
pub fn init_tracing(settings: &LoggingSettings) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(&settings.level))
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = match settings.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    match installed {
        Ok(()) => {
            tracing::debug!(level = %settings.level, format = ?settings.format, "Tracing initialised");
            true
        }
        Err(_) => false,
    }
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}
