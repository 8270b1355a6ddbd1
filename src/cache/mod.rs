//! In-memory page cache
//!
//! This module provides a bounded, TTL-aware cache keyed by the SHA-256 of the
//! normalized URL (fragment stripped). Expired entries are not removed by
//! lookups; space is reclaimed by `purge_expired`, `clear`, or by eviction when
//! the cache is full.

mod entry;

pub use entry::CacheEntry;

use crate::url::{cache_key, normalize_url};
use std::collections::HashMap;
use std::time::Duration;

/// Default number of entries held before eviction starts
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default freshness window
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(3600);

/// Bounded URL-keyed cache
///
/// When an insert would exceed capacity, entries older than the cache's
/// default max age are swept first; if the cache is still full, the oldest
/// entry is evicted.
#[derive(Debug, Clone)]
pub struct PageCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    capacity: usize,
    max_age: Duration,
}

impl<T> PageCache<T> {
    /// Creates a cache holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize, max_age: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            max_age,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The freshness window used by [`get_fresh`](Self::get_fresh) and eviction sweeps
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry for `url`, fresh or not
    pub fn get(&self, url: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(&cache_key(url))
    }

    /// Returns the cached data for `url` if it is younger than the default max age
    pub fn get_fresh(&self, url: &str) -> Option<&T> {
        self.get(url)
            .filter(|entry| entry.is_fresh(self.max_age))
            .map(|entry| &entry.data)
    }

    /// Stores `data` for `url`, replacing any previous entry
    pub fn set(&mut self, url: &str, data: T) {
        let key = cache_key(url);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.make_room();
        }

        let stored_url = normalize_url(url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());
        self.entries.insert(key, CacheEntry::new(stored_url, data));
    }

    /// True only if an entry exists and is younger than `max_age`
    pub fn is_cached(&self, url: &str, max_age: Duration) -> bool {
        self.get(url).is_some_and(|entry| entry.is_fresh(max_age))
    }

    /// Removes entries older than `max_age`, returning how many were removed
    pub fn purge_expired(&mut self, max_age: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(max_age));
        before - self.entries.len()
    }

    /// Removes every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn make_room(&mut self) {
        let swept = self.purge_expired(self.max_age);
        if swept > 0 {
            tracing::debug!("Cache swept {} expired entries", swept);
        }

        while self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());

            match oldest {
                Some(key) => {
                    if let Some(evicted) = self.entries.remove(&key) {
                        tracing::debug!("Cache evicted {}", evicted.url);
                    }
                }
                None => break,
            }
        }
    }
}

impl<T> Default for PageCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_MAX_AGE)
    }
}
