//! Stale Module Sweep
//!
//! Background task that periodically drops TTL-expired route modules.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::PreloadEngine;

/// Spawns a background task that periodically removes stale cached modules.
///
/// Lookups already treat stale modules as misses; the sweep only frees the
/// memory they hold. Abort the returned handle on shutdown.
pub fn spawn_cleanup_task(engine: PreloadEngine, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting stale module sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = engine.purge_stale();
            if removed > 0 {
                info!("Stale sweep: removed {} expired modules", removed);
            } else {
                debug!("Stale sweep: no expired modules found");
            }
        }
    })
}
