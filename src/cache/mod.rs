//! Cache Module
//!
//! Bounded in-memory cache of loaded route modules with TTL staleness and
//! frequency/recency scored eviction.

mod entry;
mod eviction;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, ModuleHandle, RouteKey};
pub use eviction::select_victim;
pub use stats::CacheStats;
pub use store::CacheStore;
