//! Shared fixtures for registry and aggregator integration tests.

#![allow(dead_code)]

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tessera_cache::{CacheProvider, CacheRegion, ProviderKind, ProviderRegistry, RegionStatistics};
use tessera_config::{CacheSettings, Properties};
use tessera_core::{TesseraError, TesseraResult};

/// Provider with a fixed region set and canned statistics.
///
/// Regions mapped to `None` report no statistics.
pub struct StubProvider {
    name: String,
    kind: ProviderKind,
    regions: RwLock<BTreeMap<String, Option<(u64, u64, u64)>>>,
    closed: AtomicBool,
    on_region_names: Option<Box<dyn Fn() + Send + Sync>>,
}

impl StubProvider {
    pub fn new(kind: ProviderKind, name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            regions: RwLock::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
            on_region_names: None,
        }
    }

    /// Runs `hook` every time the regions are enumerated.
    pub fn on_region_names(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_region_names = Some(Box::new(hook));
        self
    }

    /// Adds a region reporting `(hits, misses, objects)`.
    pub fn with_region(self, region: &str, counters: Option<(u64, u64, u64)>) -> Self {
        self.regions.write().insert(region.to_string(), counters);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl CacheProvider for StubProvider {
    fn init_configuration(&self, props: &Properties) -> TesseraResult<CacheSettings> {
        CacheSettings::from_properties(props)
    }

    fn init(&self) -> TesseraResult<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        self.kind.clone()
    }

    fn implementation(&self) -> &'static str {
        "stub"
    }

    fn region_names(&self) -> Vec<String> {
        if let Some(hook) = &self.on_region_names {
            hook();
        }
        self.regions.read().keys().cloned().collect()
    }

    fn region(&self, name: &str) -> TesseraResult<Arc<dyn CacheRegion>> {
        Err(TesseraError::RegionNotFound {
            provider: self.name.clone(),
            region: name.to_string(),
        })
    }

    fn remove_region(&self, name: &str) -> TesseraResult<()> {
        self.regions.write().remove(name);
        Ok(())
    }

    fn clear_region(&self, _name: &str) -> TesseraResult<()> {
        Ok(())
    }

    fn statistics(&self, region_name: &str) -> Option<RegionStatistics> {
        self.regions
            .read()
            .get(region_name)
            .copied()
            .flatten()
            .map(|(hits, misses, objects)| {
                RegionStatistics::new(self.name.clone(), region_name, hits, misses, objects)
            })
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Registers `stub` under `(kind, manager)` and returns it.
pub fn register_stub(
    registry: &ProviderRegistry,
    kind: ProviderKind,
    manager: &str,
    stub: StubProvider,
) -> Arc<StubProvider> {
    let stub = Arc::new(stub);
    let shared = Arc::clone(&stub);
    registry
        .get_or_create_with(&kind, manager, &Properties::new(), move |_| {
            let provider: Arc<dyn CacheProvider> = shared;
            Ok(provider)
        })
        .expect("Failed to register stub provider");
    stub
}

/// Composite keys of every item on every page, following `next_offset`.
pub fn walk_all_pages(registry: &ProviderRegistry, page_size: usize) -> Vec<String> {
    let aggregator = registry.statistics();
    let mut keys = Vec::new();
    let mut offset = 0;
    loop {
        let page = aggregator.list_all_statistics(Some(offset), Some(page_size));
        if page.is_empty() {
            break;
        }
        offset = page.next_offset();
        keys.extend(page.items.iter().map(RegionStatistics::composite_key));
    }
    keys
}
