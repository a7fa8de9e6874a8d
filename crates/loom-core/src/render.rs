//! Reconstructed-text cache
//!
//! Bounded cache of rendered node text backed by `moka`.
//!
//! # Invalidation
//! Only a childless node can change content, so no cached descendant ever
//! depends on a node whose text changes. An in-place update therefore
//! invalidates exactly the edited node's entry. Loading a record builds a
//! fresh tree and a fresh cache.

use crate::types::NodeId;
use moka::sync::Cache;
use std::sync::Arc;

pub(crate) struct RenderCache {
    inner: Option<Cache<NodeId, Arc<str>>>,
}

impl std::fmt::Debug for RenderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCache")
            .field("enabled", &self.inner.is_some())
            .field("entry_count", &self.entry_count())
            .finish()
    }
}

impl RenderCache {
    /// Capacity 0 disables caching entirely
    pub(crate) fn new(capacity: u64) -> Self {
        Self {
            inner: (capacity > 0).then(|| Cache::new(capacity)),
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<Arc<str>> {
        self.inner.as_ref()?.get(&id)
    }

    #[inline]
    pub(crate) fn insert(&self, id: NodeId, text: &str) {
        if let Some(cache) = &self.inner {
            cache.insert(id, Arc::from(text));
        }
    }

    #[inline]
    pub(crate) fn invalidate(&self, id: NodeId) {
        if let Some(cache) = &self.inner {
            cache.invalidate(&id);
        }
    }

    pub(crate) fn clear(&self) {
        if let Some(cache) = &self.inner {
            cache.invalidate_all();
        }
    }

    pub(crate) fn entry_count(&self) -> u64 {
        self.inner.as_ref().map_or(0, |cache| {
            cache.run_pending_tasks();
            cache.entry_count()
        })
    }
}
