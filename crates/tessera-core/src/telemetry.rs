//! Tracing setup for binaries and tests embedding the Tessera crates.

#[cfg(feature = "telemetry")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::TesseraResult;
use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether to install a subscriber at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_filter() -> String {
    "info,tessera=debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            filter: default_filter(),
            json: false,
        }
    }
}

/// Installs the global tracing subscriber.
///
/// A subscriber that is already installed is left in place, so tests can
/// call this freely.
#[cfg(feature = "telemetry")]
pub fn init_tracing(config: &LoggingConfig) -> TesseraResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| crate::TesseraError::Configuration(format!("Invalid log filter: {}", e)))?;

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    if installed.is_ok() {
        tracing::debug!(json = config.json, filter = %config.filter, "Tracing initialized");
    }

    Ok(())
}

/// Placeholder for when the telemetry feature is disabled.
#[cfg(not(feature = "telemetry"))]
pub fn init_tracing(_config: &LoggingConfig) -> TesseraResult<()> {
    Ok(())
}
