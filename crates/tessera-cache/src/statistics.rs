//! Per-region statistics records.

use crate::naming;
use serde::{Deserialize, Serialize};

/// Counters reported for one region of one provider instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStatistics {
    /// Encoded name of the owning instance.
    pub instance_name: String,
    /// Region name.
    pub region_name: String,
    /// Number of lookups that found a value.
    pub hit_count: u64,
    /// Number of lookups that found nothing.
    pub miss_count: u64,
    /// Number of entries currently stored.
    pub object_count: u64,
    /// `hit_count / (hit_count + miss_count)`, 0.0 without lookups.
    pub hit_ratio: f64,
    /// False for records synthesized because the backend reported none.
    pub active: bool,
}

impl RegionStatistics {
    /// Creates a record reported by a backend.
    #[must_use]
    pub fn new(
        instance_name: impl Into<String>,
        region_name: impl Into<String>,
        hit_count: u64,
        miss_count: u64,
        object_count: u64,
    ) -> Self {
        Self {
            instance_name: instance_name.into(),
            region_name: region_name.into(),
            hit_count,
            miss_count,
            object_count,
            hit_ratio: hit_ratio(hit_count, miss_count),
            active: true,
        }
    }

    /// Creates a zeroed, inactive record for a region without statistics.
    #[must_use]
    pub fn empty(instance_name: impl Into<String>, region_name: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            region_name: region_name.into(),
            hit_count: 0,
            miss_count: 0,
            object_count: 0,
            hit_ratio: 0.0,
            active: false,
        }
    }

    /// Total number of lookups.
    #[must_use]
    pub const fn request_count(&self) -> u64 {
        self.hit_count + self.miss_count
    }

    /// Composite key identifying this region across all instances.
    #[must_use]
    pub fn composite_key(&self) -> String {
        naming::encode(&self.instance_name, &self.region_name)
    }
}

#[allow(clippy::cast_precision_loss)]
fn hit_ratio(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_computes_ratio() {
        let stats = RegionStatistics::new("EhCache.default", "A", 10, 2, 5);
        assert!(stats.active);
        assert_eq!(stats.request_count(), 12);
        assert!((stats.hit_ratio - 10.0 / 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ratio_without_requests() {
        let stats = RegionStatistics::new("EhCache.default", "B", 0, 0, 0);
        assert!(stats.active);
        assert_eq!(stats.hit_ratio, 0.0);
    }

    #[test]
    fn test_empty_record() {
        let stats = RegionStatistics::empty("EhCache.default", "gone");
        assert!(!stats.active);
        assert_eq!(stats.hit_count, 0);
        assert_eq!(stats.miss_count, 0);
        assert_eq!(stats.object_count, 0);
        assert_eq!(stats.hit_ratio, 0.0);
        assert_eq!(stats.instance_name, "EhCache.default");
        assert_eq!(stats.region_name, "gone");
    }

    #[test]
    fn test_composite_key() {
        let stats = RegionStatistics::empty("EhCache.default", "A");
        assert_eq!(stats.composite_key(), "EhCache.default.A");
    }
}
