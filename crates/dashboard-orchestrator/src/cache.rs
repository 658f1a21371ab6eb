use std::sync::Arc;

use dashmap::DashMap;
use forecast_core::Bar;

/// Cache key for one instrument's history
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub market: String,
}

impl CacheKey {
    /// Normalizes the user-typed symbol the way the input box does.
    pub fn new(symbol: &str, market: &str) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            market: market.to_string(),
        }
    }
}

/// Explicit fetch-memoization collaborator.
///
/// Entries have no TTL guarantee: a cached history stays until someone
/// calls `invalidate`, and callers must not read any freshness promise
/// into a hit.
#[derive(Default)]
pub struct HistoryCache {
    entries: DashMap<CacheKey, Arc<Vec<Bar>>>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Vec<Bar>>> {
        self.entries.get(key).map(|e| Arc::clone(e.value()))
    }

    pub fn insert(&self, key: CacheKey, bars: Vec<Bar>) -> Arc<Vec<Bar>> {
        let bars = Arc::new(bars);
        self.entries.insert(key, Arc::clone(&bars));
        bars
    }

    pub fn invalidate(&self, key: &CacheKey) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
