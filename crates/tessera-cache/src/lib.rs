//! # Tessera Cache
//!
//! Cache provider registry and federated statistics for Tessera.
//!
//! A [`ProviderRegistry`] owns at most one live [`CacheProvider`] per
//! encoded instance name (`<kind>.<manager>`), refuses to hand out an
//! instance of the wrong kind under a reused name, and feeds the
//! [`StatisticsAggregator`], which merges per-region statistics from every
//! registered instance into one sorted, paginated view.
//!
//! # Architecture
//!
//! ```text
//!  caller ──get_or_create(kind, manager, props)──▶ ProviderRegistry
//!                                                   │  one lock over
//!                                                   │  name → provider
//!                  ProviderCatalog ◀── factory ─────┤
//!                  ("memory", ...)                  │
//!                                                   ▼
//!                                          Arc<dyn CacheProvider>
//!                                                   │ regions, statistics
//!  caller ──list_all_statistics(offset, size)──▶ StatisticsAggregator
//!                                                   │ snapshot names,
//!                                                   │ encode + sort keys,
//!                                                   ▼ window, resolve
//!                                      PagedResult<RegionStatistics>
//! ```
//!
//! # Example
//!
//! ```rust
//! use tessera_cache::{ProviderKind, ProviderRegistry, RegionExt};
//! use tessera_config::Properties;
//!
//! let registry = ProviderRegistry::new();
//! let props = Properties::new().with("timeToLive", 60_000);
//! let provider = registry
//!     .get_or_create(&ProviderKind::EhCache, "default", &props)
//!     .unwrap();
//!
//! let users = provider.region("users").unwrap();
//! users.put("42", &"alice").unwrap();
//! assert_eq!(users.get::<String>("42").unwrap().as_deref(), Some("alice"));
//!
//! let page = registry.statistics().list_all_statistics(None, Some(10));
//! assert_eq!(page.total_count, 1);
//! assert_eq!(page.items[0].composite_key(), "EhCache.default.users");
//! ```

pub mod aggregator;
pub mod catalog;
pub mod kind;
pub mod memory;
pub mod metrics;
pub mod naming;
pub mod provider;
pub mod registry;
pub mod statistics;

pub use aggregator::{RegionKey, StatisticsAggregator};
pub use catalog::{ProviderCatalog, ProviderEntry, ProviderFactory, MEMORY_IMPLEMENTATION};
pub use kind::ProviderKind;
pub use memory::{MemoryCacheProvider, MemoryRegion};
pub use metrics::register_metrics;
pub use provider::{CacheProvider, CacheRegion, ProviderContext, RegionExt};
pub use registry::ProviderRegistry;
pub use statistics::RegionStatistics;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::provider::{CacheProvider, CacheRegion, RegionExt};
    pub use crate::{ProviderKind, ProviderRegistry, RegionStatistics, StatisticsAggregator};
    pub use tessera_config::Properties;
    pub use tessera_core::{PageWindow, PagedResult, TesseraError, TesseraResult};
}
