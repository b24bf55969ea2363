//! Background Tasks Module
//!
//! Work that runs beside the host rather than on its request path.
//!
//! # Tasks
//! - Warm-up: three-phase eager loading of route modules
//! - Stale sweep: drops TTL-expired modules at a configured interval

mod cleanup;
mod deferral;
mod warmup;

pub use cleanup::spawn_cleanup_task;
pub use deferral::{select_deferral, Deferral, FixedDelay, HostLifecycle, Immediate};
pub use warmup::{PhaseOutcome, WarmupReport, WarmupScheduler};
