//! Cache Store Module
//!
//! Bounded route-module cache with TTL staleness and scored eviction.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::cache::eviction::select_victim;
use crate::cache::{current_timestamp_ms, CacheEntry, CacheStats, ModuleHandle, RouteKey};

// == Cache Store ==
/// Bounded mapping from route key to loaded module.
///
/// Entries leave the store only through the scoring eviction rule or TTL
/// expiry. The `*_at` variants take the current time explicitly; the plain
/// variants read the wall clock.
#[derive(Debug)]
pub struct CacheStore {
    /// Route key to entry
    entries: HashMap<RouteKey, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed (at least 1)
    max_entries: usize,
    /// Staleness age in milliseconds
    ttl_ms: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of cached modules, clamped to at least 1
    /// * `ttl` - Age after which an entry is stale
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.max(1),
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }

    // == Get ==
    /// Returns a fresh entry and records the access.
    ///
    /// A stale entry is a miss; it stays in place until a reload replaces it
    /// or the sweep removes it.
    pub fn get(&mut self, key: &str) -> Option<CacheEntry> {
        self.get_at(key, current_timestamp_ms())
    }

    pub fn get_at(&mut self, key: &str, now: u64) -> Option<CacheEntry> {
        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_stale(now, self.ttl_ms) => {
                entry.touch(now);
                self.stats.record_hit();
                Some(entry.clone())
            }
            Some(_) => {
                debug!(route = key, "cached module is stale");
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Inserts or replaces the module for `key` with fresh timestamps.
    ///
    /// When a new key would exceed the bound, the lowest-scored other entry
    /// is evicted first. Returns the evicted key, if any.
    pub fn put(&mut self, key: RouteKey, module: ModuleHandle) -> Option<RouteKey> {
        self.put_at(key, module, current_timestamp_ms())
    }

    pub fn put_at(&mut self, key: RouteKey, module: ModuleHandle, now: u64) -> Option<RouteKey> {
        let mut evicted = None;

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            let victim =
                select_victim(&self.entries, now, Some(key.as_str())).map(str::to_string);
            if let Some(victim) = victim {
                self.entries.remove(&victim);
                self.stats.record_eviction();
                debug!(route = %victim, "evicted lowest-scored module");
                evicted = Some(victim);
            }
        }

        let entry = CacheEntry::new(key.clone(), module, now);
        self.entries.insert(key, entry);
        self.stats.set_cached_count(self.entries.len());

        evicted
    }

    // == Has ==
    /// Presence check for a fresh entry; does not touch access metadata.
    pub fn has(&self, key: &str) -> bool {
        self.has_at(key, current_timestamp_ms())
    }

    pub fn has_at(&self, key: &str, now: u64) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_stale(now, self.ttl_ms))
    }

    /// Read-only view of an entry, stale or not.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Purge Stale ==
    /// Removes every stale entry. Returns the number removed.
    pub fn purge_stale(&mut self) -> usize {
        self.purge_stale_at(current_timestamp_ms())
    }

    pub fn purge_stale_at(&mut self, now: u64) -> usize {
        let ttl_ms = self.ttl_ms;
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_stale(now, ttl_ms));

        let removed = before - self.entries.len();
        self.stats.record_expirations(removed);
        self.stats.set_cached_count(self.entries.len());
        removed
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_cached_count(self.entries.len());
        stats
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const HOUR: u64 = 3_600_000;

    fn module(name: &'static str) -> ModuleHandle {
        Arc::new(name)
    }

    fn store(max: usize) -> CacheStore {
        CacheStore::new(max, Duration::from_secs(1800))
    }

    #[test]
    fn test_store_new() {
        let store = store(20);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 20);
        assert_eq!(CacheStore::new(0, Duration::ZERO).capacity(), 1);
    }

    #[test]
    fn test_put_and_get() {
        let mut store = store(20);
        store.put_at("/".to_string(), module("home"), 0);

        let entry = store.get_at("/", 10).unwrap();
        assert_eq!(entry.module.downcast_ref::<&str>(), Some(&"home"));
        assert_eq!(entry.access_count, 2);
        assert_eq!(entry.last_accessed_at, 10);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing_is_miss() {
        let mut store = store(20);
        assert!(store.get_at("/nope", 0).is_none());
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_has_does_not_touch() {
        let mut store = store(20);
        store.put_at("/".to_string(), module("home"), 0);

        assert!(store.has_at("/", 5));
        assert!(!store.has_at("/other", 5));

        let entry = store.peek("/").unwrap();
        assert_eq!(entry.access_count, 1);
        assert_eq!(entry.last_accessed_at, 0);
        assert_eq!(store.stats().hits, 0);
    }

    #[test]
    fn test_replace_resets_metadata() {
        let mut store = store(20);
        store.put_at("/".to_string(), module("v1"), 0);
        store.get_at("/", 1);
        store.get_at("/", 2);

        store.put_at("/".to_string(), module("v2"), 100);

        let entry = store.peek("/").unwrap();
        assert_eq!(entry.access_count, 1);
        assert_eq!(entry.loaded_at, 100);
        assert_eq!(entry.module.downcast_ref::<&str>(), Some(&"v2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stale_entry_is_miss() {
        let mut store = CacheStore::new(20, Duration::from_secs(30 * 60));
        store.put_at("/reports".to_string(), module("reports"), 0);

        assert!(store.get_at("/reports", 30 * 60 * 1000 - 1).is_some());
        assert!(store.get_at("/reports", 30 * 60 * 1000).is_none());
        assert!(!store.has_at("/reports", 30 * 60 * 1000));

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_eviction_removes_lowest_score() {
        let mut store = store(3);
        store.put_at("/a".to_string(), module("a"), 0);
        store.put_at("/b".to_string(), module("b"), 0);
        store.put_at("/c".to_string(), module("c"), 0);

        // /a and /c get used, /b stays at one access
        store.get_at("/a", 10);
        store.get_at("/c", 10);

        let evicted = store.put_at("/d".to_string(), module("d"), 20);

        assert_eq!(evicted.as_deref(), Some("/b"));
        assert_eq!(store.len(), 3);
        assert!(store.has_at("/a", 20));
        assert!(!store.has_at("/b", 20));
        assert!(store.has_at("/d", 20));
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_eviction_prefers_idle_entries() {
        let mut store = CacheStore::new(2, Duration::from_secs(24 * 3600));
        store.put_at("/old".to_string(), module("old"), 0);
        for t in 1..=3 {
            store.get_at("/old", t);
        }
        // /old: 4 accesses, idle ~7h -> score 0.5
        store.put_at("/new".to_string(), module("new"), 7 * HOUR);
        // /new: 1 access, idle 0h -> score 1.0

        let evicted = store.put_at("/third".to_string(), module("third"), 7 * HOUR);
        assert_eq!(evicted.as_deref(), Some("/old"));
    }

    #[test]
    fn test_eviction_tie_breaks_on_load_time() {
        let mut store = store(2);
        store.put_at("/z".to_string(), module("z"), 50);
        store.put_at("/y".to_string(), module("y"), 60);
        store.get_at("/z", 60);
        store.get_at("/y", 60);

        // Both have two accesses at t=60; /z was loaded first
        let evicted = store.put_at("/x".to_string(), module("x"), 60);
        assert_eq!(evicted.as_deref(), Some("/z"));
    }

    #[test]
    fn test_purge_stale() {
        let mut store = CacheStore::new(20, Duration::from_secs(60));
        store.put_at("/old".to_string(), module("old"), 0);
        store.put_at("/fresh".to_string(), module("fresh"), 50_000);

        let removed = store.purge_stale_at(60_000);
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert!(store.has_at("/fresh", 60_000));
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let mut store = CacheStore::new(20, Duration::from_secs(u64::MAX));
        store.put_at("/a".to_string(), module("a"), 0);

        assert!(store.has_at("/a", 100 * 365 * 24 * HOUR));
        assert_eq!(store.purge_stale_at(u64::MAX / 2), 0);
    }
}
