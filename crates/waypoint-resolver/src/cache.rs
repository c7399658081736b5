//! Bounded LRU cache of live suggestions keyed by normalized query.

use std::num::NonZeroUsize;

use lru::LruCache;
use waypoint_core::{normalize_address, SearchSuggestion};

/// A capacity of zero disables caching.
#[derive(Debug)]
pub struct SuggestionCache {
    entries: Option<LruCache<String, Vec<SearchSuggestion>>>,
}

impl SuggestionCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    /// Looks up `query`, marking it as most recently used.
    pub fn get(&mut self, query: &str) -> Option<&Vec<SearchSuggestion>> {
        self.entries.as_mut()?.get(&normalize_address(query))
    }

    /// Stores `suggestions`, evicting the least recently used query once full.
    pub fn insert(&mut self, query: &str, suggestions: Vec<SearchSuggestion>) {
        if let Some(entries) = self.entries.as_mut() {
            entries.put(normalize_address(query), suggestions);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
