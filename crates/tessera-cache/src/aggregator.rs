//! Cross-instance statistics, sorted by composite region key and paginated.

use crate::naming;
use crate::registry::ProviderRegistry;
use crate::RegionStatistics;
use serde::{Deserialize, Serialize};
use tessera_core::{PageWindow, PagedResult};
use tracing::debug;

/// A region enumerated from one instance.
///
/// Ordered by composite key first, so sorting a set of keys yields the
/// global order: instance name as primary key, region name as secondary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionKey {
    /// `<instance>.<region>`
    pub composite: String,
    /// Encoded name of the owning instance.
    pub instance_name: String,
    /// Region name, [`naming::EMPTY_REGION`] when the backend reported a blank one.
    pub region_name: String,
}

impl RegionKey {
    /// Creates the key for a region of an instance.
    #[must_use]
    pub fn new(instance_name: impl Into<String>, region_name: &str) -> Self {
        let instance_name = instance_name.into();
        let region_name = naming::region_or_empty(region_name).to_string();
        Self {
            composite: naming::encode(&instance_name, &region_name),
            instance_name,
            region_name,
        }
    }
}

impl std::fmt::Display for RegionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.composite)
    }
}

/// Read-only view over a registry's statistics.
///
/// The registry lock is only taken for the name snapshot and for each
/// instance lookup; backend calls run without it. The result is a
/// snapshot: an instance or region that disappears mid-walk shows up as an
/// inactive, zeroed record.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsAggregator<'a> {
    registry: &'a ProviderRegistry,
}

impl<'a> StatisticsAggregator<'a> {
    #[must_use]
    pub const fn new(registry: &'a ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Returns one page of statistics across every registered instance.
    ///
    /// Missing values default to offset 0 and a page size of
    /// [`tessera_core::DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub fn list_all_statistics(
        &self,
        offset: Option<usize>,
        page_size: Option<usize>,
    ) -> PagedResult<RegionStatistics> {
        self.list_window(PageWindow::new(offset, page_size))
    }

    /// Returns the statistics for `window`.
    ///
    /// `total_count` is the number of regions across all instances, for
    /// every window.
    #[must_use]
    pub fn list_window(&self, window: PageWindow) -> PagedResult<RegionStatistics> {
        let keys = self.region_keys();
        if keys.is_empty() {
            debug!(offset = window.offset, page_size = window.page_size, "No cache regions registered");
            return PagedResult::empty(window);
        }

        let total = keys.len();
        let items: Vec<RegionStatistics> = keys
            .into_iter()
            .skip(window.offset)
            .take(window.page_size)
            .map(|key| self.resolve(key))
            .collect();

        debug!(
            offset = window.offset,
            page_size = window.page_size,
            returned = items.len(),
            total,
            "Aggregated cache statistics"
        );
        PagedResult::new(items, total, window)
    }

    /// Every region of every registered instance, sorted.
    #[must_use]
    pub fn region_keys(&self) -> Vec<RegionKey> {
        let names = self.registry.list_names();

        let mut keys: Vec<RegionKey> = names
            .into_iter()
            .filter_map(|name| self.registry.instance(&name).map(|provider| (name, provider)))
            .flat_map(|(name, provider)| {
                provider
                    .region_names()
                    .into_iter()
                    .map(move |region| RegionKey::new(name.clone(), &region))
            })
            .collect();

        keys.sort_unstable();
        keys
    }

    fn resolve(&self, key: RegionKey) -> RegionStatistics {
        self.registry
            .instance(&key.instance_name)
            .and_then(|provider| provider.statistics(&key.region_name))
            .unwrap_or_else(|| {
                debug!(region = %key, "No statistics reported, using empty record");
                RegionStatistics::empty(key.instance_name, key.region_name)
            })
    }
}
