//! Route Preload - predictive route-module preloading
//!
//! Warms route modules into a bounded TTL cache before the user navigates,
//! learns navigation patterns and schedules warm-up around the host's
//! paint and idle lifecycle.

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod network;
pub mod patterns;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::{Config, PreloadConfig};
pub use engine::{
    normalize_route, EngineStats, FsModuleLoader, ModuleLoader, PreloadEngine, PreloadOutcome,
    SpeculativePreload,
};
pub use error::{PreloadError, Result};
pub use network::{classify_connection, NetworkClass, NetworkSignal, SharedNetworkSignal};
pub use patterns::{JsonFilePatternStore, MemoryPatternStore, PatternStore, Prediction};
pub use tasks::{
    select_deferral, spawn_cleanup_task, Deferral, HostLifecycle, PhaseOutcome, WarmupReport,
    WarmupScheduler,
};
