//! In-process cache provider backed by Moka.
//!
//! Each region is its own `moka::sync::Cache`, sized and expired by the
//! region's resolved settings. Hit and miss counters live next to the cache
//! because Moka does not track them.

use crate::metrics::{record_region_entries, record_region_lookup};
use crate::provider::{CacheProvider, CacheRegion, ProviderContext};
use crate::{ProviderKind, RegionStatistics};
use moka::sync::Cache;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tessera_config::{CacheSettings, Properties, RegionSettings, DEFAULT_REGION_NAME, MAX_TIME_TO_LIVE};
use tessera_core::{TesseraError, TesseraResult};
use tracing::{debug, info};

/// Implementation identifier of [`MemoryCacheProvider`].
pub const IMPLEMENTATION: &str = "memory";

/// A region of a [`MemoryCacheProvider`].
pub struct MemoryRegion {
    name: String,
    owner: String,
    cache: Cache<String, String>,
    settings: RegionSettings,
    hits: AtomicU64,
    misses: AtomicU64,
    publish_metrics: bool,
}

impl MemoryRegion {
    fn new(owner: &str, name: &str, settings: RegionSettings, publish_metrics: bool) -> Self {
        let cache = Cache::builder()
            .max_capacity(settings.max_entries)
            .time_to_live(settings.time_to_live.min(MAX_TIME_TO_LIVE))
            .build();

        Self {
            name: name.to_string(),
            owner: owner.to_string(),
            cache,
            settings,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            publish_metrics,
        }
    }

    /// Settings this region was created with.
    #[must_use]
    pub const fn settings(&self) -> RegionSettings {
        self.settings
    }

    /// Snapshot of this region's counters.
    #[must_use]
    pub fn statistics(&self) -> RegionStatistics {
        RegionStatistics::new(
            &self.owner,
            &self.name,
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.len(),
        )
    }

    fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }
}

impl CacheRegion for MemoryRegion {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_raw(&self, key: &str) -> TesseraResult<Option<String>> {
        let value = self.cache.get(key);
        let hit = value.is_some();
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }

        if self.publish_metrics {
            record_region_lookup(&self.owner, &self.name, hit);
        }
        Ok(value)
    }

    fn put_raw(&self, key: &str, value: String) -> TesseraResult<()> {
        self.cache.insert(key.to_string(), value);
        if self.publish_metrics {
            record_region_entries(&self.owner, &self.name, self.len());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> TesseraResult<bool> {
        Ok(self.cache.remove(key).is_some())
    }

    fn contains_key(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    fn clear(&self) -> TesseraResult<()> {
        self.invalidate_all();
        debug!(provider = %self.owner, region = %self.name, "Region cleared");
        Ok(())
    }

    fn len(&self) -> u64 {
        // entry_count lags behind until pending maintenance has run
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl std::fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRegion")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Default in-process backend.
///
/// Serves whatever kind it was created for, so it satisfies the registry's
/// kind check for every built-in kind.
pub struct MemoryCacheProvider {
    context: ProviderContext,
    settings: RwLock<Option<CacheSettings>>,
    regions: RwLock<BTreeMap<String, Arc<MemoryRegion>>>,
    initialized: AtomicBool,
    closed: AtomicBool,
}

impl MemoryCacheProvider {
    /// Creates an unconfigured provider for `context`.
    #[must_use]
    pub fn new(context: &ProviderContext) -> Self {
        Self {
            context: context.clone(),
            settings: RwLock::new(None),
            regions: RwLock::new(BTreeMap::new()),
            initialized: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Settings in effect, or defaults before configuration.
    #[must_use]
    pub fn settings(&self) -> CacheSettings {
        self.settings.read().clone().unwrap_or_default()
    }

    /// Returns true once [`CacheProvider::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> TesseraResult<()> {
        if self.is_closed() {
            return Err(TesseraError::ProviderClosed(self.context.encoded_name.clone()));
        }
        Ok(())
    }

    /// Maps a requested region name to the region that stores it.
    fn resolve_region_name<'a>(&self, settings: &CacheSettings, name: &'a str) -> &'a str {
        if settings.default_region_usage || name.trim().is_empty() {
            DEFAULT_REGION_NAME
        } else {
            name
        }
    }

    fn memory_region(&self, name: &str) -> TesseraResult<Arc<MemoryRegion>> {
        self.ensure_open()?;
        let settings = self.settings();
        let name = self.resolve_region_name(&settings, name);

        if let Some(region) = self.regions.read().get(name) {
            return Ok(Arc::clone(region));
        }

        let mut regions = self.regions.write();
        // close() may have drained the map since the first check
        self.ensure_open()?;
        let region = regions.entry(name.to_string()).or_insert_with(|| {
            debug!(provider = %self.context.encoded_name, region = %name, "Creating region");
            Arc::new(MemoryRegion::new(
                &self.context.encoded_name,
                name,
                settings.region(name),
                settings.cache_manager_register,
            ))
        });
        Ok(Arc::clone(region))
    }
}

impl CacheProvider for MemoryCacheProvider {
    fn init_configuration(&self, props: &Properties) -> TesseraResult<CacheSettings> {
        let settings = CacheSettings::from_properties(props)?;
        *self.settings.write() = Some(settings.clone());
        Ok(settings)
    }

    fn init(&self) -> TesseraResult<bool> {
        self.ensure_open()?;
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }

        let settings = self.settings();
        if !settings.default_region_usage {
            for region in settings.configured_regions() {
                self.memory_region(region)?;
            }
        }

        info!(
            provider = %self.context.encoded_name,
            regions = self.regions.read().len(),
            statistics = settings.statistics_enabled,
            "Memory cache provider initialized"
        );
        Ok(true)
    }

    fn name(&self) -> &str {
        &self.context.encoded_name
    }

    fn kind(&self) -> ProviderKind {
        self.context.kind.clone()
    }

    fn implementation(&self) -> &'static str {
        IMPLEMENTATION
    }

    fn region_names(&self) -> Vec<String> {
        self.regions.read().keys().cloned().collect()
    }

    fn region(&self, name: &str) -> TesseraResult<Arc<dyn CacheRegion>> {
        let region: Arc<dyn CacheRegion> = self.memory_region(name)?;
        Ok(region)
    }

    fn remove_region(&self, name: &str) -> TesseraResult<()> {
        self.ensure_open()?;
        let settings = self.settings();
        let name = self.resolve_region_name(&settings, name);

        if let Some(region) = self.regions.write().remove(name) {
            region.invalidate_all();
            debug!(provider = %self.context.encoded_name, region = %name, "Region removed");
        }
        Ok(())
    }

    fn clear_region(&self, name: &str) -> TesseraResult<()> {
        self.ensure_open()?;
        let settings = self.settings();
        let name = self.resolve_region_name(&settings, name);

        let region = self
            .regions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| TesseraError::RegionNotFound {
                provider: self.context.encoded_name.clone(),
                region: name.to_string(),
            })?;
        region.clear()
    }

    fn statistics(&self, region_name: &str) -> Option<RegionStatistics> {
        let settings = self.settings();
        if !settings.statistics_enabled {
            return None;
        }

        let name = self.resolve_region_name(&settings, region_name);
        self.regions.read().get(name).map(|region| region.statistics())
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let regions = std::mem::take(&mut *self.regions.write());
        for region in regions.values() {
            region.invalidate_all();
        }
        info!(
            provider = %self.context.encoded_name,
            regions = regions.len(),
            "Memory cache provider closed"
        );
    }
}

impl std::fmt::Debug for MemoryCacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheProvider")
            .field("name", &self.context.encoded_name)
            .field("regions", &self.regions.read().len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
