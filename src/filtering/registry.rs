//! Process-wide table of filter capabilities.
//!
//! New filter kinds are added by registering them at bootstrap; the
//! orchestrator never needs to change. Registration is expected to happen
//! before requests are served. Lookups only take a read lock afterwards.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use super::filter::{EnumFilter, Filter};
use crate::errors::RegistryError;

static GLOBAL_REGISTRY: LazyLock<FilterRegistry> = LazyLock::new(FilterRegistry::with_defaults);

#[derive(Default)]
pub struct FilterRegistry {
    filters: RwLock<HashMap<String, Arc<dyn Filter>>>,
}

impl FilterRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in filters (`enum`).
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(EnumFilter::KEY, EnumFilter);
        registry
    }

    /// The shared registry used by [`QueryOrchestrator::for_model`](crate::QueryOrchestrator::for_model).
    pub fn global() -> &'static Self {
        &GLOBAL_REGISTRY
    }

    /// Bind `key` to `filter`, replacing any previous binding for that key.
    pub fn register<F>(&self, key: impl Into<String>, filter: F)
    where
        F: Filter + 'static,
    {
        self.register_arc(key, Arc::new(filter));
    }

    pub fn register_arc(&self, key: impl Into<String>, filter: Arc<dyn Filter>) {
        let key = key.into();
        let mut filters = self.filters.write().unwrap_or_else(PoisonError::into_inner);
        if filters.insert(key.clone(), filter).is_some() {
            tracing::debug!(key = %key, "Replaced filter registration");
        }
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] naming `key` when nothing is bound to it.
    pub fn lookup(&self, key: &str) -> Result<Arc<dyn Filter>, RegistryError> {
        self.filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                key: key.to_string(),
            })
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Snapshot of every binding, sorted by key.
    #[must_use]
    pub fn list_all(&self) -> Vec<(String, Arc<dyn Filter>)> {
        let mut entries: Vec<_> = self
            .filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(key, filter)| (key.clone(), Arc::clone(filter)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Register `filter` in the global registry.
pub fn register_filter<F>(key: impl Into<String>, filter: F)
where
    F: Filter + 'static,
{
    FilterRegistry::global().register(key, filter);
}
