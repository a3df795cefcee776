//! Provider contract implemented by every cache backend.

use crate::{ProviderKind, RegionStatistics};
use std::sync::Arc;
use tessera_config::{CacheSettings, Properties};
use tessera_core::TesseraResult;

/// Identity handed to a provider factory when the registry creates an
/// instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderContext {
    /// Requested kind.
    pub kind: ProviderKind,
    /// Caller-supplied logical grouping; empty when not set.
    pub manager_name: String,
    /// Registry key, `<kind>` or `<kind>.<manager>`.
    pub encoded_name: String,
}

impl ProviderContext {
    /// Creates a context, deriving the encoded name.
    #[must_use]
    pub fn new(kind: ProviderKind, manager_name: impl Into<String>) -> Self {
        let manager_name = manager_name.into().trim().to_string();
        let encoded_name = crate::naming::instance_name(&kind, &manager_name);
        Self {
            kind,
            manager_name,
            encoded_name,
        }
    }
}

/// A pluggable cache backend.
///
/// Instances are shared through `Arc`, so every operation takes `&self`.
/// The registry calls [`init_configuration`](Self::init_configuration)
/// and then [`init`](Self::init) exactly once per created instance.
#[cfg_attr(test, mockall::automock)]
pub trait CacheProvider: Send + Sync {
    /// Parses and applies a flat configuration map. Idempotent.
    fn init_configuration(&self, props: &Properties) -> TesseraResult<CacheSettings>;

    /// Makes the provider ready. Returns false if it was already initialized.
    ///
    /// The registry calls this, [`init_configuration`](Self::init_configuration)
    /// and the catalog factory while holding its table lock. Implementations
    /// must not call back into the [`ProviderRegistry`](crate::ProviderRegistry)
    /// from these paths; the lock is not reentrant and the call deadlocks.
    fn init(&self) -> TesseraResult<bool>;

    /// Encoded instance name.
    fn name(&self) -> &str;

    /// Backend family this provider implements.
    fn kind(&self) -> ProviderKind;

    /// Identifier of the backend implementation, used in diagnostics.
    fn implementation(&self) -> &'static str;

    /// Currently known region names, possibly empty.
    fn region_names(&self) -> Vec<String>;

    /// Returns the named region, creating it if necessary.
    fn region(&self, name: &str) -> TesseraResult<Arc<dyn CacheRegion>>;

    /// Drops a region and its contents. Unknown regions are ignored.
    fn remove_region(&self, name: &str) -> TesseraResult<()>;

    /// Removes every entry of an existing region.
    fn clear_region(&self, name: &str) -> TesseraResult<()>;

    /// Statistics for a region, or `None` if it has none.
    fn statistics(&self, region_name: &str) -> Option<RegionStatistics>;

    /// Releases all backend resources. Repeated calls are no-ops.
    fn close(&self);
}

/// Handle to a named region of a provider.
///
/// Values are stored as JSON text; [`RegionExt`] adds typed access.
pub trait CacheRegion: Send + Sync {
    /// Region name.
    fn name(&self) -> &str;

    /// Looks up a raw value, counting a hit or a miss.
    fn get_raw(&self, key: &str) -> TesseraResult<Option<String>>;

    /// Stores a raw value.
    fn put_raw(&self, key: &str, value: String) -> TesseraResult<()>;

    /// Removes a value. Returns true if it existed.
    fn remove(&self, key: &str) -> TesseraResult<bool>;

    /// Checks for a key without touching hit/miss counters.
    fn contains_key(&self, key: &str) -> bool;

    /// Removes every entry.
    fn clear(&self) -> TesseraResult<()>;

    /// Number of stored entries.
    fn len(&self) -> u64;

    /// Returns true if the region holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Typed access on top of [`CacheRegion`].
pub trait RegionExt: CacheRegion {
    /// Get a typed value from the region.
    fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> TesseraResult<Option<T>> {
        match self.get_raw(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Store a typed value in the region.
    fn put<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> TesseraResult<()> {
        let json = serde_json::to_string(value)?;
        self.put_raw(key, json)
    }

    /// Get a value or compute and store it if not present.
    fn get_or_insert_with<T, F>(&self, key: &str, factory: F) -> TesseraResult<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
        F: FnOnce() -> TesseraResult<T>,
    {
        if let Some(cached) = self.get::<T>(key)? {
            return Ok(cached);
        }

        let value = factory()?;
        self.put(key, &value)?;
        Ok(value)
    }
}

impl<R: CacheRegion + ?Sized> RegionExt for R {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_derives_encoded_name() {
        let ctx = ProviderContext::new(ProviderKind::EhCache, "default");
        assert_eq!(ctx.encoded_name, "EhCache.default");
        assert_eq!(ctx.manager_name, "default");

        let ctx = ProviderContext::new(ProviderKind::ScEhHibernate, " ");
        assert_eq!(ctx.encoded_name, "ScEhHibernate");
        assert!(ctx.manager_name.is_empty());
    }
}
