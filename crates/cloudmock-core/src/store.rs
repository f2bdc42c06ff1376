//! Guarded resource container used by every mock service.
//!
//! A [`ResourceStore`] maps resource identifiers (queue names, table names,
//! bucket names, ...) to values. It is the only mutable state a service owns;
//! the gateway never touches it directly and reaches it only through the
//! service's request handler and `reset`.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Errors returned by [`ResourceStore`] mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A resource with this identifier already exists.
    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    /// No resource with this identifier exists.
    #[error("resource not found: {0}")]
    NotFound(String),
}

/// Thread-safe, name-keyed resource map with create/read/update/delete operations.
///
/// Backed by `DashMap`, so concurrent requests touching different resources do
/// not contend on a single lock.
#[derive(Debug)]
pub struct ResourceStore<V> {
    inner: DashMap<String, V>,
}

impl<V: Clone> ResourceStore<V> {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Insert a new resource, failing if the identifier is taken.
    pub fn create(&self, id: impl Into<String>, value: V) -> Result<V, StoreError> {
        match self.inner.entry(id.into()) {
            Entry::Occupied(e) => Err(StoreError::AlreadyExists(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(value.clone());
                Ok(value)
            }
        }
    }

    /// Return the existing resource, or insert the one built by `make`.
    ///
    /// Used by idempotent create operations (e.g. `CreateQueue`, `CreateTopic`).
    pub fn get_or_create(&self, id: impl Into<String>, make: impl FnOnce() -> V) -> V {
        self.inner.entry(id.into()).or_insert_with(make).clone()
    }

    /// Insert or replace a resource.
    pub fn put(&self, id: impl Into<String>, value: V) -> Option<V> {
        self.inner.insert(id.into(), value)
    }

    /// Get a copy of a resource.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<V> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    /// Get a copy of a resource or return [`StoreError::NotFound`].
    pub fn require(&self, id: &str) -> Result<V, StoreError> {
        self.get(id).ok_or_else(|| StoreError::NotFound(id.to_owned()))
    }

    /// Mutate a resource in place and return the closure's result.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut V) -> R) -> Result<R, StoreError> {
        let mut entry = self
            .inner
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
        Ok(f(entry.value_mut()))
    }

    /// Remove a resource, returning it.
    pub fn remove(&self, id: &str) -> Result<V, StoreError> {
        self.inner
            .remove(id)
            .map(|(_, v)| v)
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))
    }

    /// Whether a resource with this identifier exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains_key(id)
    }

    /// All resources sorted by identifier.
    ///
    /// Sorting keeps list responses stable regardless of hash iteration order.
    #[must_use]
    pub fn list(&self) -> Vec<(String, V)> {
        let mut items: Vec<(String, V)> = self
            .inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items
    }

    /// Remove every resource.
    pub fn clear(&self) {
        let cleared = self.inner.len();
        self.inner.clear();
        tracing::trace!(cleared, "resource store cleared");
    }

    /// Number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<V: Clone> Default for ResourceStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
