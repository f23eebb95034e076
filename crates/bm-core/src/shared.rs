//! Atomically swappable store handle
//!
//! Matching reads a store snapshot per call; updates replace the whole store
//! in one pointer swap. A call observes either the old store or the new one,
//! never a mix of both.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::fuzzy::{fuzzy_url_matcher, FuzzyEntry};
use crate::matcher::Classifier;
use crate::store::PatternStore;
use crate::types::{BugId, MatchResult};

/// Shared, replaceable [`PatternStore`].
pub struct SharedStore {
    inner: ArcSwap<PatternStore>,
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new(PatternStore::empty())
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("version", &self.version())
            .finish()
    }
}

impl SharedStore {
    pub fn new(store: PatternStore) -> Self {
        Self {
            inner: ArcSwap::from_pointee(store),
        }
    }

    /// Current store. Hold the returned `Arc` for the duration of one request.
    #[inline]
    pub fn load(&self) -> Arc<PatternStore> {
        self.inner.load_full()
    }

    /// Install `store`, returning the one it replaced.
    pub fn replace(&self, store: PatternStore) -> Arc<PatternStore> {
        let version = store.version();
        let previous = self.inner.swap(Arc::new(store));
        log::info!(
            "Pattern store replaced: version {} -> {}",
            previous.version(),
            version
        );
        previous
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.inner.load().version()
    }

    pub fn is_bug(&self, url: &str) -> MatchResult {
        let store = self.inner.load();
        Classifier::new(&store).is_bug(url)
    }

    pub fn is_first_party_exception(&self, bug_id: BugId, tab_url: &str) -> bool {
        let store = self.inner.load();
        Classifier::new(&store).is_first_party_exception(bug_id, tab_url)
    }

    /// Convenience passthrough; the fuzzy matcher does not read the store.
    pub fn fuzzy_url_matcher(&self, url: &str, entries: &[FuzzyEntry]) -> bool {
        fuzzy_url_matcher(url, entries)
    }
}
