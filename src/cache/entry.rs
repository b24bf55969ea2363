//! Cache Entry Module
//!
//! Defines a cached route module together with its access metadata.

use std::any::Any;
use std::sync::Arc;

/// Opaque handle to a loaded route module. The engine stores and returns
/// it but never looks inside.
pub type ModuleHandle = Arc<dyn Any + Send + Sync>;

/// Stable identifier of a lazily-loadable route module.
pub type RouteKey = String;

// == Cache Entry ==
/// A loaded route module and its access metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Route the module belongs to
    pub route_key: RouteKey,
    /// The loaded module
    pub module: ModuleHandle,
    /// Load timestamp (Unix milliseconds)
    pub loaded_at: u64,
    /// Last access timestamp (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Number of accesses, starting at 1 on insertion
    pub access_count: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a freshly loaded entry with `access_count = 1`.
    pub fn new(route_key: RouteKey, module: ModuleHandle, now: u64) -> Self {
        Self {
            route_key,
            module,
            loaded_at: now,
            last_accessed_at: now,
            access_count: 1,
        }
    }

    // == Is Stale ==
    /// Checks whether the entry has outlived `ttl_ms` since it was loaded.
    ///
    /// Boundary condition: an entry is stale as soon as its age reaches the
    /// TTL, so a TTL of zero makes every entry stale.
    pub fn is_stale(&self, now: u64, ttl_ms: u64) -> bool {
        self.age_ms(now) >= ttl_ms
    }

    /// Milliseconds since the module was loaded.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.loaded_at)
    }

    // == Touch ==
    /// Records one access at `now`.
    pub fn touch(&mut self, now: u64) {
        self.last_accessed_at = now;
        self.access_count += 1;
    }

    // == Eviction Score ==
    /// Frequency discounted by hours since last access:
    /// `access_count / (1 + recency_seconds / 3600)`.
    ///
    /// Lower scores are evicted first.
    pub fn eviction_score(&self, now: u64) -> f64 {
        let recency_secs = now.saturating_sub(self.last_accessed_at) as f64 / 1000.0;
        self.access_count as f64 / (1.0 + recency_secs / 3600.0)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
