//! Catalog of backend implementations selectable by name.
//!
//! `provider.implementation` names an entry in the catalog; the registry
//! resolves it before touching its table, so an unknown name fails the
//! request even when an instance already exists.

use crate::memory::{MemoryCacheProvider, IMPLEMENTATION};
use crate::provider::{CacheProvider, ProviderContext};
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::{TesseraError, TesseraResult};

/// Catalog name of the in-process backend.
pub const MEMORY_IMPLEMENTATION: &str = IMPLEMENTATION;

/// Builds a new, not yet initialized provider instance.
pub type ProviderFactory =
    Arc<dyn Fn(&ProviderContext) -> TesseraResult<Arc<dyn CacheProvider>> + Send + Sync>;

/// A named backend implementation.
#[derive(Clone)]
pub struct ProviderEntry {
    /// Unique implementation name (e.g., "memory")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Factory function to create provider instances
    pub factory: ProviderFactory,
}

impl ProviderEntry {
    /// Creates a provider instance for `context`.
    pub fn create(&self, context: &ProviderContext) -> TesseraResult<Arc<dyn CacheProvider>> {
        (self.factory)(context)
    }
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Backend implementations known to a registry.
#[derive(Clone, Debug, Default)]
pub struct ProviderCatalog {
    entries: BTreeMap<String, ProviderEntry>,
}

impl ProviderCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the built-in backends.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut catalog = Self::empty();
        catalog.register(
            MEMORY_IMPLEMENTATION,
            "Moka-backed in-process cache",
            |context: &ProviderContext| {
                let provider: Arc<dyn CacheProvider> = Arc::new(MemoryCacheProvider::new(context));
                Ok(provider)
            },
        );
        catalog
    }

    /// Adds or replaces an implementation.
    pub fn register<F>(&mut self, name: impl Into<String>, description: impl Into<String>, factory: F)
    where
        F: Fn(&ProviderContext) -> TesseraResult<Arc<dyn CacheProvider>> + Send + Sync + 'static,
    {
        let name = name.into();
        self.entries.insert(
            name.clone(),
            ProviderEntry {
                name,
                description: description.into(),
                factory: Arc::new(factory),
            },
        );
    }

    /// Looks up an implementation by name.
    pub fn resolve(&self, name: &str) -> TesseraResult<&ProviderEntry> {
        self.entries.get(name).ok_or_else(|| {
            let available: Vec<&str> = self.entries.keys().map(String::as_str).collect();
            TesseraError::Configuration(format!(
                "Unknown cache provider implementation '{}'. Available implementations: {:?}",
                name, available
            ))
        })
    }

    /// Lists `(name, description)` for every implementation.
    #[must_use]
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.entries
            .values()
            .map(|e| (e.name.as_str(), e.description.as_str()))
            .collect()
    }

    /// Returns true if an implementation is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}
