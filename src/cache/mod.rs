//! Memoization of query results.
//!
//! Maps `QueryParams` to an immutable `Arc<ResultSet>`. Entries expire after a
//! fixed TTL because the underlying corpus changes between sessions; a fresh
//! entry is never overwritten. When the cache is full the oldest entry is
//! evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::models::{QueryParams, ResultSet};

struct CacheEntry {
    result: Arc<ResultSet>,
    cached_at: Instant,
}

/// TTL-bounded cache of query results.
pub struct QueryCache {
    entries: Mutex<HashMap<QueryParams, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl QueryCache {
    /// Create a cache.
    ///
    /// # Arguments
    /// * `ttl` - Lifetime of an entry
    /// * `max_entries` - Capacity; 0 disables caching
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    /// Fresh cached result for `params`, if any.
    pub fn get(&self, params: &QueryParams) -> Option<Arc<ResultSet>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(params)
            .filter(|entry| entry.cached_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.result))
    }

    /// Store a result unless a fresh one is already cached.
    ///
    /// # Returns
    /// The result now cached for `params`: the existing fresh entry if there
    /// was one, otherwise `result`
    pub fn insert(&self, params: QueryParams, result: Arc<ResultSet>) -> Arc<ResultSet> {
        if self.max_entries == 0 {
            return result;
        }

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = entries.get(&params) {
            if existing.cached_at.elapsed() < self.ttl {
                return Arc::clone(&existing.result);
            }
        }

        entries.retain(|_, entry| entry.cached_at.elapsed() < self.ttl);
        while entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.cached_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    debug!("Evicting cached query '{}'", key.keyword);
                    entries.remove(&key);
                }
                None => break,
            }
        }

        entries.insert(
            params,
            CacheEntry {
                result: Arc::clone(&result),
                cached_at: Instant::now(),
            },
        );
        result
    }

    /// Number of entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
