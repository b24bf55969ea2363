//! Engine diagnostics snapshot.

use serde::Serialize;

use crate::network::NetworkClass;

/// Read-only view of the engine's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    /// Modules currently cached
    pub cached_count: usize,
    /// Loads currently running
    pub in_flight_count: usize,
    /// Routes registered with the engine
    pub total_known_routes: usize,
    /// Set once the warm-up scheduler has finished every phase
    pub eager_loading_complete: bool,
    /// Distinct navigation transitions learned
    pub learned_patterns: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub hit_rate: f64,
    /// Network class at snapshot time
    pub network: NetworkClass,
}
