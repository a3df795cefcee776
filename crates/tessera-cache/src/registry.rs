//! Registry of live provider instances.
//!
//! One mutex guards the whole `encoded name -> provider` table. It is held
//! across the existence check, the insert, and the new instance's
//! initialization, which serializes instance creation. Creation is rare, so
//! the single lock is kept; sharding it by name hash would not change the
//! public contract.

use crate::aggregator::StatisticsAggregator;
use crate::catalog::ProviderCatalog;
use crate::metrics::{record_conflict, record_created, record_live, record_reused};
use crate::naming;
use crate::provider::{CacheProvider, ProviderContext};
use crate::ProviderKind;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tessera_config::{keys, validate_manager_name, CacheSettings, Properties, DEFAULT_IMPLEMENTATION};
use tessera_core::{TesseraError, TesseraResult};
use tracing::{debug, error, info, warn};

/// Process-wide table of provider instances, keyed by encoded name.
///
/// Construct one at application start and pass it by reference (or in an
/// `Arc`) to every component that needs a cache provider.
pub struct ProviderRegistry {
    instances: Mutex<HashMap<String, Arc<dyn CacheProvider>>>,
    catalog: ProviderCatalog,
}

impl ProviderRegistry {
    /// Creates an empty registry with the built-in backends.
    #[must_use]
    pub fn new() -> Self {
        Self::with_catalog(ProviderCatalog::with_defaults())
    }

    /// Creates an empty registry resolving backends from `catalog`.
    #[must_use]
    pub fn with_catalog(catalog: ProviderCatalog) -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
            catalog,
        }
    }

    /// Backend implementations available to this registry.
    #[must_use]
    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Returns the live instance for `(kind, manager_name)`, creating it
    /// from the `provider.implementation` backend if none exists.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the implementation is unknown, the names are
    ///   malformed, or the properties do not parse.
    /// - `IdentityConflict` if the name is bound to a provider of another kind.
    pub fn get_or_create(
        &self,
        kind: &ProviderKind,
        manager_name: &str,
        props: &Properties,
    ) -> TesseraResult<Arc<dyn CacheProvider>> {
        let implementation = props.get_or(keys::PROVIDER_IMPLEMENTATION, DEFAULT_IMPLEMENTATION);
        let entry = self.catalog.resolve(implementation)?;
        self.get_or_create_with(kind, manager_name, props, |context| entry.create(context))
    }

    /// Like [`get_or_create`](Self::get_or_create), with kind and manager
    /// taken from the `provider` and `provider.name` properties.
    pub fn get_or_create_from_properties(&self, props: &Properties) -> TesseraResult<Arc<dyn CacheProvider>> {
        let settings = CacheSettings::from_properties(props)?;
        let kind = ProviderKind::parse(&settings.provider);
        self.get_or_create(&kind, &settings.manager_name, props)
    }

    /// Returns the live instance for `(kind, manager_name)`, or registers
    /// and initializes the one built by `factory`.
    ///
    /// `factory` only runs when no instance exists. A new instance is
    /// configured with `props` and then initialized; if either step fails
    /// it is unregistered again and the error is returned.
    pub fn get_or_create_with<F>(
        &self,
        kind: &ProviderKind,
        manager_name: &str,
        props: &Properties,
        factory: F,
    ) -> TesseraResult<Arc<dyn CacheProvider>>
    where
        F: FnOnce(&ProviderContext) -> TesseraResult<Arc<dyn CacheProvider>>,
    {
        kind.validate()?;
        validate_manager_name(manager_name.trim())?;
        let context = ProviderContext::new(kind.clone(), manager_name);

        let mut instances = self.instances.lock();

        if let Some(existing) = instances.get(&context.encoded_name) {
            if kind.is_satisfied_by(existing.as_ref()) {
                record_reused(kind.name());
                debug!(provider = %context.encoded_name, "Reusing cache provider");
                return Ok(Arc::clone(existing));
            }
            return Err(conflict(&context, existing.as_ref()));
        }

        let provider = factory(&context)?;
        if !kind.is_satisfied_by(provider.as_ref()) {
            return Err(conflict(&context, provider.as_ref()));
        }

        instances.insert(context.encoded_name.clone(), Arc::clone(&provider));
        let pending = PendingEntry {
            instances: &mut *instances,
            name: &context.encoded_name,
            armed: true,
        };

        let initialized = provider
            .init_configuration(props)
            .and_then(|_| provider.init());
        if let Err(e) = initialized {
            drop(pending);
            warn!(provider = %context.encoded_name, error = %e, "Cache provider failed to initialize");
            return Err(e);
        }

        let live = pending.commit();
        record_created(kind.name());
        record_live(live);
        info!(
            provider = %context.encoded_name,
            implementation = provider.implementation(),
            "Cache provider created"
        );
        Ok(provider)
    }

    /// Returns the instance for `(kind, manager_name)` without creating it.
    #[must_use]
    pub fn get(&self, kind: &ProviderKind, manager_name: &str) -> Option<Arc<dyn CacheProvider>> {
        self.instance(&naming::instance_name(kind, manager_name))
    }

    /// Returns the instance registered under an encoded name.
    #[must_use]
    pub fn instance(&self, encoded_name: &str) -> Option<Arc<dyn CacheProvider>> {
        self.instances.lock().get(encoded_name).cloned()
    }

    /// Removes the entry for `(kind, manager_name)` without closing it.
    ///
    /// Returns the removed instance so the caller can close it.
    pub fn unbind(&self, kind: &ProviderKind, manager_name: &str) -> Option<Arc<dyn CacheProvider>> {
        let encoded_name = naming::instance_name(kind, manager_name);
        let mut instances = self.instances.lock();
        let removed = instances.remove(&encoded_name);
        if removed.is_some() {
            record_live(instances.len());
            info!(provider = %encoded_name, "Cache provider unbound");
        }
        removed
    }

    /// Closes every registered instance and empties the table.
    pub fn close_all(&self) {
        let drained: Vec<(String, Arc<dyn CacheProvider>)> = {
            let mut instances = self.instances.lock();
            let drained = instances.drain().collect();
            record_live(0);
            drained
        };

        for (name, provider) in &drained {
            debug!(provider = %name, "Closing cache provider");
            provider.close();
        }

        if !drained.is_empty() {
            info!(count = drained.len(), "All cache providers closed");
        }
    }

    /// Snapshot of the registered encoded names.
    #[must_use]
    pub fn list_names(&self) -> BTreeSet<String> {
        self.instances.lock().keys().cloned().collect()
    }

    /// Number of registered instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    /// Returns true if no instance is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.lock().is_empty()
    }

    /// Paginated statistics across every registered instance.
    #[must_use]
    pub fn statistics(&self) -> StatisticsAggregator<'_> {
        StatisticsAggregator::new(self)
    }
}

/// A freshly inserted entry, removed again on drop unless committed.
///
/// Also covers a backend that panics during initialization.
struct PendingEntry<'a> {
    instances: &'a mut HashMap<String, Arc<dyn CacheProvider>>,
    name: &'a str,
    armed: bool,
}

impl PendingEntry<'_> {
    /// Keeps the entry and returns the number of registered instances.
    fn commit(mut self) -> usize {
        self.armed = false;
        self.instances.len()
    }
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.instances.remove(self.name);
        }
    }
}

fn conflict(context: &ProviderContext, actual: &dyn CacheProvider) -> TesseraError {
    record_conflict(context.kind.name());
    let actual = format!("{} ({})", actual.kind(), actual.implementation());
    error!(
        provider = %context.encoded_name,
        expected = %context.kind,
        actual = %actual,
        "Cache provider name bound to a different kind"
    );
    TesseraError::identity_conflict(&context.encoded_name, &context.kind, actual)
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("instances", &self.list_names())
            .field("catalog", &self.catalog.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockCacheProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn mock(kind: ProviderKind, name: &str) -> MockCacheProvider {
        let mut mock = MockCacheProvider::new();
        mock.expect_kind().return_const(kind);
        mock.expect_name().return_const(name.to_string());
        mock.expect_implementation().return_const("mock");
        mock
    }

    #[test]
    fn test_get_or_create_returns_same_instance() {
        let registry = ProviderRegistry::new();
        let props = Properties::new();

        let first = registry.get_or_create(&ProviderKind::EhCache, "default", &props).unwrap();
        let second = registry.get_or_create(&ProviderKind::EhCache, "default", &props).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "EhCache.default");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_blank_manager_uses_kind_name() {
        let registry = ProviderRegistry::new();
        let provider = registry
            .get_or_create(&ProviderKind::ScEhHibernate, "", &Properties::new())
            .unwrap();
        assert_eq!(provider.name(), "ScEhHibernate");
        assert!(registry.get(&ProviderKind::ScEhHibernate, "  ").is_some());
    }

    #[test]
    fn test_factory_runs_once() {
        let registry = ProviderRegistry::new();
        let calls = AtomicUsize::new(0);
        let catalog = ProviderCatalog::with_defaults();
        let entry = catalog.resolve("memory").unwrap();

        for _ in 0..3 {
            registry
                .get_or_create_with(&ProviderKind::EhCache, "default", &Properties::new(), |ctx| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    entry.create(ctx)
                })
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_new_instance_configured_then_initialized() {
        let registry = ProviderRegistry::new();
        let mut seq = mockall::Sequence::new();
        let mut provider = mock(ProviderKind::EhCache, "EhCache.default");
        provider
            .expect_init_configuration()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|props| CacheSettings::from_properties(props));
        provider
            .expect_init()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(true));

        let provider: Arc<dyn CacheProvider> = Arc::new(provider);
        let created = registry
            .get_or_create_with(&ProviderKind::EhCache, "default", &Properties::new(), |_| {
                Ok(Arc::clone(&provider))
            })
            .unwrap();
        assert!(Arc::ptr_eq(&created, &provider));
    }

    #[test]
    fn test_failed_init_unregisters() {
        let registry = ProviderRegistry::new();
        let mut provider = mock(ProviderKind::EhCache, "EhCache.default");
        provider
            .expect_init_configuration()
            .returning(|props| CacheSettings::from_properties(props));
        provider
            .expect_init()
            .returning(|| Err(TesseraError::backend("EhCache.default", "disk full")));

        let err = registry
            .get_or_create_with(&ProviderKind::EhCache, "default", &Properties::new(), move |_| {
                let provider: Arc<dyn CacheProvider> = Arc::new(provider);
                Ok(provider)
            })
            .err()
            .unwrap();

        assert_eq!(err.error_code(), "BACKEND_ERROR");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_panicking_init_unregisters() {
        let registry = ProviderRegistry::new();
        let mut provider = mock(ProviderKind::EhCache, "EhCache.default");
        provider
            .expect_init_configuration()
            .returning(|props| CacheSettings::from_properties(props));
        provider.expect_init().returning(|| panic!("backend exploded"));

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            registry.get_or_create_with(&ProviderKind::EhCache, "default", &Properties::new(), move |_| {
                let provider: Arc<dyn CacheProvider> = Arc::new(provider);
                Ok(provider)
            })
        }));

        assert!(outcome.is_err());
        assert!(registry.is_empty());

        let provider = registry
            .get_or_create(&ProviderKind::EhCache, "default", &Properties::new())
            .unwrap();
        assert_eq!(provider.implementation(), "memory");
    }

    #[test]
    fn test_out_of_range_time_to_live_unregisters() {
        let registry = ProviderRegistry::new();
        for key in ["timeToLive", "users.timeToLive"] {
            let props = Properties::new().with(key, u64::MAX);
            let err = registry
                .get_or_create(&ProviderKind::EhCache, "default", &props)
                .err()
                .unwrap();
            assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
            assert!(registry.is_empty());
        }

        let props = Properties::new().with("users.timeToLive", 50);
        let provider = registry
            .get_or_create(&ProviderKind::EhCache, "default", &props)
            .unwrap();
        assert_eq!(provider.region_names(), vec!["users"]);
    }

    #[test]
    fn test_invalid_configuration_unregisters() {
        let registry = ProviderRegistry::new();
        let props = Properties::new().with("timeToLive", "never");
        let err = registry
            .get_or_create(&ProviderKind::EhCache, "default", &props)
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_conflict_on_existing_entry() {
        let registry = ProviderRegistry::new();
        let original = registry
            .get_or_create(&ProviderKind::EhCache, "default", &Properties::new())
            .unwrap();

        let err = registry
            .get_or_create(&ProviderKind::custom("EhCache"), "default", &Properties::new())
            .err()
            .unwrap();

        assert!(err.is_fatal());
        let msg = err.to_string();
        assert!(msg.contains("EhCache.default"));
        assert!(msg.contains("memory"));

        let kept = registry.get(&ProviderKind::EhCache, "default").unwrap();
        assert!(Arc::ptr_eq(&original, &kept));
    }

    #[test]
    fn test_conflict_on_new_instance_of_wrong_kind() {
        let registry = ProviderRegistry::new();
        let provider = mock(ProviderKind::ScEhHibernate, "EhCache.default");

        let err = registry
            .get_or_create_with(&ProviderKind::EhCache, "default", &Properties::new(), move |_| {
                let provider: Arc<dyn CacheProvider> = Arc::new(provider);
                Ok(provider)
            })
            .err()
            .unwrap();

        match err {
            TesseraError::IdentityConflict { name, expected, actual } => {
                assert_eq!(name, "EhCache.default");
                assert_eq!(expected, "EhCache");
                assert_eq!(actual, "ScEhHibernate (mock)");
            }
            other => panic!("Expected IdentityConflict, got {other:?}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_implementation_fails_even_when_registered() {
        let registry = ProviderRegistry::new();
        registry
            .get_or_create(&ProviderKind::EhCache, "default", &Properties::new())
            .unwrap();

        let props = Properties::new().with("provider.implementation", "com.example.Missing");
        let err = registry
            .get_or_create(&ProviderKind::EhCache, "default", &props)
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_manager_with_separator_rejected() {
        let registry = ProviderRegistry::new();
        let err = registry
            .get_or_create(&ProviderKind::EhCache, "a.b", &Properties::new())
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_get_or_create_from_properties() {
        let registry = ProviderRegistry::new();
        let props = Properties::new()
            .with("provider", "ScEhHibernate")
            .with("provider.name", "reports");

        let provider = registry.get_or_create_from_properties(&props).unwrap();
        assert_eq!(provider.name(), "ScEhHibernate.reports");
        assert_eq!(provider.kind(), ProviderKind::ScEhHibernate);
    }

    #[test]
    fn test_unbind() {
        let registry = ProviderRegistry::new();
        let provider = registry
            .get_or_create(&ProviderKind::EhCache, "default", &Properties::new())
            .unwrap();
        provider.region("users").unwrap();

        let removed = registry.unbind(&ProviderKind::EhCache, "default").unwrap();
        assert!(Arc::ptr_eq(&removed, &provider));
        assert!(registry.is_empty());
        assert!(registry.unbind(&ProviderKind::EhCache, "default").is_none());

        // not closed by unbind
        assert!(removed.region("users").is_ok());
    }

    #[test]
    fn test_close_all() {
        let registry = ProviderRegistry::new();
        registry.close_all();

        let a = registry
            .get_or_create(&ProviderKind::EhCache, "a", &Properties::new())
            .unwrap();
        registry
            .get_or_create(&ProviderKind::EhCache, "b", &Properties::new())
            .unwrap();

        registry.close_all();

        assert!(registry.is_empty());
        assert_eq!(a.region("users").err().unwrap().error_code(), "PROVIDER_CLOSED");
    }

    #[test]
    fn test_close_all_invokes_close() {
        let registry = ProviderRegistry::new();
        let mut provider = mock(ProviderKind::EhCache, "EhCache");
        provider
            .expect_init_configuration()
            .returning(|props| CacheSettings::from_properties(props));
        provider.expect_init().returning(|| Ok(true));
        provider.expect_close().times(1).return_const(());

        registry
            .get_or_create_with(&ProviderKind::EhCache, "", &Properties::new(), move |_| {
                let provider: Arc<dyn CacheProvider> = Arc::new(provider);
                Ok(provider)
            })
            .unwrap();
        registry.close_all();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_names() {
        let registry = ProviderRegistry::new();
        registry
            .get_or_create(&ProviderKind::EhCache, "reports", &Properties::new())
            .unwrap();
        registry
            .get_or_create(&ProviderKind::EhCache, "default", &Properties::new())
            .unwrap();

        let names: Vec<String> = registry.list_names().into_iter().collect();
        assert_eq!(names, vec!["EhCache.default", "EhCache.reports"]);
    }

    #[test]
    fn test_concurrent_get_or_create_yields_one_instance() {
        let registry = ProviderRegistry::new();
        let providers: Vec<Arc<dyn CacheProvider>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        registry
                            .get_or_create(&ProviderKind::EhCache, "shared", &Properties::new())
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(registry.len(), 1);
        for provider in &providers[1..] {
            assert!(Arc::ptr_eq(&providers[0], provider));
        }
    }
}
