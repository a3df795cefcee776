//! Metrics for the provider registry and cache regions.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding application installs a recorder.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Metric names for the cache subsystem.
pub mod names {
    /// Provider instances created by the registry.
    pub const PROVIDERS_CREATED_TOTAL: &str = "tessera_cache_providers_created_total";
    /// Lookups answered with an existing provider instance.
    pub const PROVIDERS_REUSED_TOTAL: &str = "tessera_cache_providers_reused_total";
    /// Requests rejected because a name is bound to another kind.
    pub const IDENTITY_CONFLICTS_TOTAL: &str = "tessera_cache_identity_conflicts_total";
    /// Provider instances currently registered.
    pub const PROVIDERS_LIVE: &str = "tessera_cache_providers_live";

    /// Region lookups that found a value.
    pub const REGION_HITS_TOTAL: &str = "tessera_cache_region_hits_total";
    /// Region lookups that found nothing.
    pub const REGION_MISSES_TOTAL: &str = "tessera_cache_region_misses_total";
    /// Entries stored in a region.
    pub const REGION_ENTRIES: &str = "tessera_cache_region_entries";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        names::PROVIDERS_CREATED_TOTAL,
        "Total number of cache provider instances created"
    );
    describe_counter!(
        names::PROVIDERS_REUSED_TOTAL,
        "Total number of requests served by an existing provider instance"
    );
    describe_counter!(
        names::IDENTITY_CONFLICTS_TOTAL,
        "Total number of provider requests rejected for a kind mismatch"
    );
    describe_gauge!(
        names::PROVIDERS_LIVE,
        "Current number of registered provider instances"
    );
    describe_counter!(
        names::REGION_HITS_TOTAL,
        "Total number of region lookups that found a value"
    );
    describe_counter!(
        names::REGION_MISSES_TOTAL,
        "Total number of region lookups that found nothing"
    );
    describe_gauge!(
        names::REGION_ENTRIES,
        "Current number of entries stored in a region"
    );
}

pub(crate) fn record_created(kind: &str) {
    counter!(names::PROVIDERS_CREATED_TOTAL, "kind" => kind.to_string()).increment(1);
}

pub(crate) fn record_reused(kind: &str) {
    counter!(names::PROVIDERS_REUSED_TOTAL, "kind" => kind.to_string()).increment(1);
}

pub(crate) fn record_conflict(kind: &str) {
    counter!(names::IDENTITY_CONFLICTS_TOTAL, "kind" => kind.to_string()).increment(1);
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn record_live(count: usize) {
    gauge!(names::PROVIDERS_LIVE).set(count as f64);
}

pub(crate) fn record_region_lookup(provider: &str, region: &str, hit: bool) {
    let name = if hit {
        names::REGION_HITS_TOTAL
    } else {
        names::REGION_MISSES_TOTAL
    };
    counter!(name, "provider" => provider.to_string(), "region" => region.to_string()).increment(1);
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn record_region_entries(provider: &str, region: &str, entries: u64) {
    gauge!(names::REGION_ENTRIES, "provider" => provider.to_string(), "region" => region.to_string())
        .set(entries as f64);
}
