//! Three-phase warm-up scheduler.
//!
//! One pass per engine:
//! 1. Immediate: the critical routes are enqueued at once, whatever the network.
//! 2. High priority: after first paint, unless the network is slow or save-data.
//! 3. Background: at idle time, every remaining known route in fixed-size
//!    batches with a pause between them. The network is re-checked before
//!    each batch and a degraded reading stops the phase.
//!
//! A phase starts only after the previous one was triggered; their loads may
//! overlap. Individual load failures are counted, never fatal.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::RouteKey;
use crate::engine::{Enqueued, PreloadEngine};
use crate::error::Result;
use crate::network::NetworkClass;
use crate::tasks::Deferral;

/// How one warm-up phase ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum PhaseOutcome {
    Completed {
        attempted: usize,
        failed: usize,
    },
    /// Not started because of the network class at phase start
    Skipped { network: NetworkClass },
    /// Stopped between batches because the network degraded
    Preempted {
        attempted: usize,
        failed: usize,
        network: NetworkClass,
    },
}

/// Summary of a finished warm-up pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarmupReport {
    pub immediate: PhaseOutcome,
    pub high_priority: PhaseOutcome,
    pub background: PhaseOutcome,
    /// Size of each background batch, in order
    pub background_batches: Vec<usize>,
}

type PhaseLoads = Vec<(RouteKey, Enqueued)>;

// == Warmup Scheduler ==
/// Drives the phased warm-up of an engine's cache.
pub struct WarmupScheduler {
    critical: Vec<RouteKey>,
    high_priority: Vec<RouteKey>,
    deferral: Arc<dyn Deferral>,
}

impl WarmupScheduler {
    pub fn new(
        critical: Vec<RouteKey>,
        high_priority: Vec<RouteKey>,
        deferral: Arc<dyn Deferral>,
    ) -> Self {
        Self {
            critical,
            high_priority,
            deferral,
        }
    }

    // == Start ==
    /// Enqueues the critical routes right away and spawns the rest of the
    /// pass. Must be called from within a tokio runtime.
    ///
    /// Fails with `WarmupAlreadyStarted` on a second call for the same engine.
    pub fn start(self, engine: &PreloadEngine) -> Result<JoinHandle<WarmupReport>> {
        engine.begin_warmup()?;
        engine.register_routes(self.critical.iter().chain(&self.high_priority).cloned());

        info!("Immediate phase: enqueuing {} critical routes", self.critical.len());
        let immediate = enqueue_all(engine, &self.critical);

        let engine = engine.clone();
        Ok(tokio::spawn(async move { self.run(engine, immediate).await }))
    }

    async fn run(self, engine: PreloadEngine, immediate: PhaseLoads) -> WarmupReport {
        self.deferral.after_first_paint().await;

        let network = engine.network_class();
        let high_priority = if network.allows_speculative() {
            info!(
                "High-priority phase: enqueuing {} routes",
                self.high_priority.len()
            );
            Some(enqueue_all(&engine, &self.high_priority))
        } else {
            info!(%network, "High-priority phase skipped");
            None
        };

        self.deferral.until_idle().await;
        let (background, background_batches) = self.run_background(&engine).await;

        let immediate = settle(immediate).await;
        let high_priority = match high_priority {
            Some(loads) => settle(loads).await,
            None => PhaseOutcome::Skipped { network },
        };

        engine.mark_eager_loading_complete();

        WarmupReport {
            immediate,
            high_priority,
            background,
            background_batches,
        }
    }

    async fn run_background(&self, engine: &PreloadEngine) -> (PhaseOutcome, Vec<usize>) {
        let network = engine.network_class();
        if !network.allows_speculative() {
            info!(%network, "Background phase skipped");
            return (PhaseOutcome::Skipped { network }, Vec::new());
        }

        let remaining = engine.uncached_known_routes();
        let batch_size = engine.config().background_batch_size.max(1);
        let batch_delay = engine.config().background_batch_delay;
        info!(
            "Background phase: {} routes in batches of {}",
            remaining.len(),
            batch_size
        );

        let mut batches = Vec::new();
        let mut attempted = 0;
        let mut failed = 0;

        for (index, batch) in remaining.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(batch_delay).await;
            }

            let network = engine.network_class();
            if !network.allows_speculative() {
                info!(%network, "Background phase preempted after {} routes", attempted);
                return (
                    PhaseOutcome::Preempted {
                        attempted,
                        failed,
                        network,
                    },
                    batches,
                );
            }

            let outcomes = engine.preload_routes(batch).await;
            batches.push(batch.len());
            attempted += batch.len();
            failed += outcomes.iter().filter(|o| !o.is_success()).count();
        }

        (PhaseOutcome::Completed { attempted, failed }, batches)
    }
}

fn enqueue_all(engine: &PreloadEngine, routes: &[RouteKey]) -> PhaseLoads {
    routes
        .iter()
        .map(|route| (route.clone(), engine.enqueue(route, false)))
        .collect()
}

async fn settle(loads: PhaseLoads) -> PhaseOutcome {
    let attempted = loads.len();
    let results = join_all(loads.into_iter().map(|(_, load)| load.wait())).await;
    let failed = results.iter().filter(|r| r.is_err()).count();
    PhaseOutcome::Completed { attempted, failed }
}
