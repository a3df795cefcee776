//! Configuration loader with layered sources.

use crate::{CacheSettings, Properties};
use config::{Config, ConfigError, Environment, File};
use parking_lot::RwLock;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tessera_core::TesseraError;
use tracing::{debug, info};

/// Table holding cache provider properties in layered sources.
pub const CACHE_SECTION: &str = "cache";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "TESSERA";

/// Loads cache provider [`Properties`] from layered sources, with
/// runtime reload.
#[derive(Clone)]
pub struct ConfigLoader {
    properties: Arc<RwLock<Properties>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Properties are read from the `[cache]` table of each source, in order:
    /// 1. `{dir}/default.toml` - Default values
    /// 2. `{dir}/{environment}.toml` - Environment-specific overrides
    /// 3. `{dir}/local.toml` - Local overrides
    /// 4. Environment variables such as `TESSERA_CACHE__TIMETOLIVE`
    ///
    /// Nested tables flatten to dotted keys, so `[cache.users] timeToLive = 5`
    /// becomes `users.timeToLive = "5"`.
    pub fn new(config_dir: impl Into<String>) -> Result<Self, TesseraError> {
        let config_dir = config_dir.into();
        let properties = Self::load_properties(&config_dir)?;

        Ok(Self {
            properties: Arc::new(RwLock::new(properties)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, TesseraError> {
        Self::new("./config")
    }

    /// Returns the current properties.
    pub fn properties(&self) -> Properties {
        self.properties.read().clone()
    }

    /// Parses the current properties into [`CacheSettings`].
    pub fn settings(&self) -> Result<CacheSettings, TesseraError> {
        CacheSettings::from_properties(&self.properties.read())
    }

    /// Reloads the properties from disk and the environment.
    pub fn reload(&self) -> Result<(), TesseraError> {
        let reloaded = Self::load_properties(&self.config_dir)?;
        *self.properties.write() = reloaded;
        info!(config_dir = %self.config_dir, "Cache configuration reloaded");
        Ok(())
    }

    fn load_properties(config_dir: &str) -> Result<Properties, TesseraError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment = std::env::var("TESSERA_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        info!(environment = %environment, config_dir = %config_dir, "Loading cache configuration");

        let mut builder = Config::builder();

        for layer in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, layer);
            if Path::new(&path).exists() {
                debug!("Loading config layer from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_tessera_error)?;
        let root: Value = config
            .try_deserialize()
            .map_err(config_error_to_tessera_error)?;

        let mut properties = Properties::new();
        if let Some(section) = root.get(CACHE_SECTION) {
            flatten_into(&mut properties, None, section);
        }

        debug!(count = properties.len(), "Cache properties loaded");
        Ok(properties)
    }
}

fn flatten_into(properties: &mut Properties, prefix: Option<&str>, value: &Value) {
    let join = |key: &str| match prefix {
        Some(prefix) => format!("{}.{}", prefix, key),
        None => key.to_string(),
    };

    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(properties, Some(&join(key)), nested);
            }
        }
        Value::Null => {}
        leaf => {
            if let Some(key) = prefix {
                properties.insert(key, scalar_to_string(leaf));
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

fn config_error_to_tessera_error(err: ConfigError) -> TesseraError {
    TesseraError::Configuration(err.to_string())
}
