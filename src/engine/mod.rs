//! Engine Module
//!
//! The preload facade plus the loader seam and in-flight de-duplication it
//! is built on.

mod inflight;
mod loader;
mod preload;
mod route;
mod stats;

pub use inflight::{InFlightLoads, SharedLoad};
pub use loader::{FsModuleLoader, ModuleLoader};
pub(crate) use preload::Enqueued;
pub use preload::{PreloadEngine, PreloadOutcome, SpeculativePreload};
pub use route::normalize_route;
pub use stats::EngineStats;
