//! Resolved cache provider settings.

use crate::Properties;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tessera_core::{TesseraError, TesseraResult};

/// Recognized property keys.
pub mod keys {
    /// Provider kind name.
    pub const PROVIDER: &str = "provider";
    /// Logical manager name.
    pub const PROVIDER_NAME: &str = "provider.name";
    /// Catalog name of a custom backend.
    pub const PROVIDER_IMPLEMENTATION: &str = "provider.implementation";
    /// Collapse all regions into the shared default region.
    pub const DEFAULT_REGION_USAGE: &str = "defaultRegionUsage";
    /// Publish backend counters to the metrics recorder.
    pub const CACHE_MANAGER_REGISTER: &str = "cacheManager.register";
    /// Turn off statistics collection.
    pub const STATISTICS_DISABLE: &str = "statistics.disable";
    /// Default region expiry in milliseconds; `<region>.timeToLive` overrides.
    pub const TIME_TO_LIVE: &str = "timeToLive";
    /// Default region capacity; `<region>.maxEntries` overrides.
    pub const MAX_ENTRIES: &str = "maxEntries";
}

/// Provider kind used when `provider` is not set.
pub const DEFAULT_PROVIDER: &str = "EhCache";

/// Backend used when `provider.implementation` is not set.
pub const DEFAULT_IMPLEMENTATION: &str = "memory";

/// Default region expiry (360 000 ms).
pub const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_millis(360_000);

/// Longest accepted region expiry (100 years).
///
/// The backing cache refuses expiries beyond 1000 years.
pub const MAX_TIME_TO_LIVE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Default region capacity.
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Name of the shared region used when `defaultRegionUsage` is on.
pub const DEFAULT_REGION_NAME: &str = "default";

/// Per-region settings after applying overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSettings {
    /// Entry expiry.
    pub time_to_live: Duration,
    /// Maximum number of entries.
    pub max_entries: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct RegionOverride {
    time_to_live: Option<Duration>,
    max_entries: Option<u64>,
}

/// Cache provider settings resolved from a [`Properties`] map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Provider kind name.
    pub provider: String,
    /// Logical manager name; empty when not set.
    pub manager_name: String,
    /// Catalog name of the backend implementation.
    pub implementation: String,
    /// Whether every region collapses into [`DEFAULT_REGION_NAME`].
    pub default_region_usage: bool,
    /// Whether backend counters are published to the metrics recorder.
    pub cache_manager_register: bool,
    /// Whether statistics are collected.
    pub statistics_enabled: bool,
    /// Default region expiry.
    pub time_to_live: Duration,
    /// Default region capacity.
    pub max_entries: u64,
    region_overrides: BTreeMap<String, RegionOverride>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            manager_name: String::new(),
            implementation: DEFAULT_IMPLEMENTATION.to_string(),
            default_region_usage: false,
            cache_manager_register: false,
            statistics_enabled: true,
            time_to_live: DEFAULT_TIME_TO_LIVE,
            max_entries: DEFAULT_MAX_ENTRIES,
            region_overrides: BTreeMap::new(),
        }
    }
}

impl CacheSettings {
    /// Parses and validates settings from a property map.
    ///
    /// Parsing is pure, so repeated calls with the same map yield equal
    /// settings.
    pub fn from_properties(props: &Properties) -> TesseraResult<Self> {
        let manager_name = props.get(keys::PROVIDER_NAME).unwrap_or_default().to_string();
        validate_manager_name(&manager_name)?;

        let time_to_live = parse_time_to_live(props, keys::TIME_TO_LIVE)?.unwrap_or(DEFAULT_TIME_TO_LIVE);
        let max_entries = props
            .get_u64(keys::MAX_ENTRIES)?
            .unwrap_or(DEFAULT_MAX_ENTRIES);

        Ok(Self {
            provider: props.get_or(keys::PROVIDER, DEFAULT_PROVIDER).to_string(),
            manager_name,
            implementation: props
                .get_or(keys::PROVIDER_IMPLEMENTATION, DEFAULT_IMPLEMENTATION)
                .to_string(),
            default_region_usage: props.get_bool(keys::DEFAULT_REGION_USAGE)?.unwrap_or(false),
            cache_manager_register: props.get_bool(keys::CACHE_MANAGER_REGISTER)?.unwrap_or(false),
            statistics_enabled: !props.get_bool(keys::STATISTICS_DISABLE)?.unwrap_or(false),
            time_to_live,
            max_entries,
            region_overrides: parse_region_overrides(props)?,
        })
    }

    /// Returns the effective settings for `region`.
    #[must_use]
    pub fn region(&self, region: &str) -> RegionSettings {
        let overrides = self
            .region_overrides
            .get(region)
            .copied()
            .unwrap_or_default();
        RegionSettings {
            time_to_live: overrides.time_to_live.unwrap_or(self.time_to_live),
            max_entries: overrides.max_entries.unwrap_or(self.max_entries),
        }
    }

    /// Names of the regions that carry explicit overrides.
    pub fn configured_regions(&self) -> impl Iterator<Item = &str> {
        self.region_overrides.keys().map(String::as_str)
    }
}

/// Rejects manager names that would make composite region keys ambiguous.
pub fn validate_manager_name(manager_name: &str) -> TesseraResult<()> {
    if manager_name.contains('.') {
        return Err(TesseraError::Configuration(format!(
            "Manager name '{}' must not contain '.'",
            manager_name
        )));
    }
    Ok(())
}

fn parse_region_overrides(props: &Properties) -> TesseraResult<BTreeMap<String, RegionOverride>> {
    let mut overrides: BTreeMap<String, RegionOverride> = BTreeMap::new();

    for (key, _) in props.iter() {
        if let Some(region) = region_prefix(key, keys::TIME_TO_LIVE) {
            let ttl = parse_time_to_live(props, key)?;
            overrides.entry(region.to_string()).or_default().time_to_live = ttl;
        } else if let Some(region) = region_prefix(key, keys::MAX_ENTRIES) {
            let max = props.get_u64(key)?;
            overrides.entry(region.to_string()).or_default().max_entries = max;
        }
    }

    Ok(overrides)
}

fn parse_time_to_live(props: &Properties, key: &str) -> TesseraResult<Option<Duration>> {
    let Some(millis) = props.get_u64(key)? else {
        return Ok(None);
    };
    let ttl = Duration::from_millis(millis);
    if ttl > MAX_TIME_TO_LIVE {
        return Err(TesseraError::Configuration(format!(
            "Property '{}' is {} ms, above the maximum of {} ms",
            key,
            millis,
            MAX_TIME_TO_LIVE.as_millis()
        )));
    }
    Ok(Some(ttl))
}

/// Splits `<region>.<option>`; the region part may itself contain dots.
fn region_prefix<'a>(key: &'a str, option: &str) -> Option<&'a str> {
    let split = key.len().checked_sub(option.len() + 1)?;
    if !key.is_char_boundary(split) {
        return None;
    }
    let (region, suffix) = key.split_at(split);
    let suffix = suffix.strip_prefix('.')?;
    (suffix.eq_ignore_ascii_case(option) && !region.is_empty()).then_some(region)
}
