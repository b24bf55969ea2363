//! Preload Engine
//!
//! The facade the rendering host talks to: warms route modules into the
//! cache, de-duplicates concurrent loads and drives predictive prefetch from
//! learned navigation patterns.

use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, ModuleHandle, RouteKey};
use crate::config::PreloadConfig;
use crate::engine::inflight::{InFlightLoads, SharedLoad};
use crate::engine::{EngineStats, ModuleLoader};
use crate::error::{PreloadError, Result};
use crate::network::{NetworkClass, NetworkSignal};
use crate::patterns::{PatternLearner, PatternStore, PatternWriter, Prediction};

/// Result of preloading one route as part of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct PreloadOutcome {
    pub route: RouteKey,
    pub result: Result<()>,
}

impl PreloadOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Predictions for the current route and the background task warming them.
#[derive(Debug)]
pub struct SpeculativePreload {
    pub predictions: Vec<Prediction>,
    /// `None` when every predicted route was already cached
    pub task: Option<JoinHandle<Vec<PreloadOutcome>>>,
}

/// How a preload request was satisfied.
pub(crate) enum Enqueued {
    /// A fresh module was already cached
    Cached,
    /// A load is running, new or joined
    Load(SharedLoad),
}

impl Enqueued {
    pub(crate) async fn wait(self) -> Result<()> {
        match self {
            Enqueued::Cached => Ok(()),
            Enqueued::Load(load) => load.await,
        }
    }
}

// Lock order: in_flight before cache; learner before the writer's state.
struct EngineInner {
    config: PreloadConfig,
    cache: Mutex<CacheStore>,
    in_flight: Mutex<InFlightLoads>,
    learner: Mutex<PatternLearner>,
    writer: PatternWriter,
    known_routes: RwLock<BTreeSet<RouteKey>>,
    loader: Arc<dyn ModuleLoader>,
    signal: Arc<dyn NetworkSignal>,
    warmup_started: AtomicBool,
    eager_loading_complete: AtomicBool,
}

// == Preload Engine ==
/// Predictive route-module preloader.
///
/// Cheap to clone; clones share one cache, one in-flight table and one
/// learner. Construct one per application and hand clones to consumers.
#[derive(Clone)]
pub struct PreloadEngine {
    inner: Arc<EngineInner>,
}

impl PreloadEngine {
    // == Constructor ==
    /// Creates an engine and loads the persisted navigation patterns.
    ///
    /// A failing pattern store never fails construction; the engine simply
    /// starts without predictions.
    pub fn new(
        config: PreloadConfig,
        loader: Arc<dyn ModuleLoader>,
        signal: Arc<dyn NetworkSignal>,
        store: Arc<dyn PatternStore>,
    ) -> Self {
        let cache = CacheStore::new(config.max_cache_size, config.cache_ttl);
        let learner = PatternLearner::load(store.as_ref(), config.pattern_cap);
        let writer = PatternWriter::new(store);

        Self {
            inner: Arc::new(EngineInner {
                config,
                cache: Mutex::new(cache),
                in_flight: Mutex::new(InFlightLoads::new()),
                learner: Mutex::new(learner),
                writer,
                known_routes: RwLock::new(BTreeSet::new()),
                loader,
                signal,
                warmup_started: AtomicBool::new(false),
                eager_loading_complete: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &PreloadConfig {
        &self.inner.config
    }

    /// Adds routes to the known set the background warm-up works from.
    pub fn register_routes<I, S>(&self, routes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<RouteKey>,
    {
        let mut known = self.inner.known_routes.write();
        known.extend(routes.into_iter().map(Into::into));
    }

    // == Preload Route ==
    /// Makes sure the module for `route` is cached.
    ///
    /// Without `force`, a fresh cached module satisfies the request at no
    /// cost. A load already running for `route` is awaited instead of
    /// starting another. A failed load is returned to the caller, who may
    /// retry or fall back to loading synchronously.
    pub async fn preload_route(&self, route: &str, force: bool) -> Result<()> {
        self.enqueue(route, force).wait().await
    }

    /// Registers the request without waiting for it.
    pub(crate) fn enqueue(&self, route: &str, force: bool) -> Enqueued {
        let mut in_flight = self.inner.in_flight.lock();

        if !force && self.inner.cache.lock().get(route).is_some() {
            debug!(route, "route module already cached");
            return Enqueued::Cached;
        }

        if let Some(load) = in_flight.get(route) {
            debug!(route, "joining in-flight load");
            return Enqueued::Load(load);
        }

        let load = self.start_load(route);
        in_flight.insert(route.to_string(), load.clone());
        Enqueued::Load(load)
    }

    /// Spawns the load so it runs to completion even if every waiter goes
    /// away. The caller must hold the in-flight lock.
    fn start_load(&self, route: &str) -> SharedLoad {
        let inner = Arc::clone(&self.inner);
        let route = route.to_string();

        let load = async move {
            let result = match AssertUnwindSafe(inner.loader.load(&route))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!("module loader panicked")),
            };

            let mut in_flight = inner.in_flight.lock();
            let outcome = match result {
                Ok(module) => {
                    let evicted = inner.cache.lock().put(route.clone(), module);
                    if let Some(evicted) = evicted {
                        debug!(route = %route, evicted = %evicted, "cache full");
                    }
                    debug!(route = %route, "route module cached");
                    Ok(())
                }
                Err(e) => {
                    warn!(route = %route, "route module failed to load: {:#}", e);
                    Err(PreloadError::load_failure(route.as_str(), &e))
                }
            };
            in_flight.remove(&route);
            outcome
        }
        .boxed()
        .shared();

        tokio::spawn(load.clone());
        load
    }

    // == Preload Routes ==
    /// Preloads every route concurrently and reports each outcome.
    ///
    /// One failure never cancels the others.
    pub async fn preload_routes<S: AsRef<str>>(&self, routes: &[S]) -> Vec<PreloadOutcome> {
        let loads = routes.iter().map(|route| {
            let route = route.as_ref().to_string();
            async move {
                let result = self.preload_route(&route, false).await;
                PreloadOutcome { route, result }
            }
        });

        let outcomes = join_all(loads).await;
        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        if failed > 0 {
            debug!(failed, total = outcomes.len(), "preload group finished with failures");
        }
        outcomes
    }

    // == Is Preloaded ==
    /// Whether a fresh module for `route` is cached. Does not count as an access.
    pub fn is_preloaded(&self, route: &str) -> bool {
        self.inner.cache.lock().has(route)
    }

    /// Access count of the cached entry for `route`, stale or not. Does not
    /// count as an access.
    pub fn access_count(&self, route: &str) -> Option<u64> {
        self.inner.cache.lock().peek(route).map(|entry| entry.access_count)
    }

    /// Takes the cached module for `route`, counting the access.
    pub fn module(&self, route: &str) -> Option<ModuleHandle> {
        self.inner.cache.lock().get(route).map(|entry| entry.module)
    }

    // == Record Navigation ==
    /// Feeds one observed navigation to the learner and returns at once.
    ///
    /// The updated table is persisted in the background; only the newest
    /// snapshot is guaranteed to reach the store.
    pub fn record_navigation(&self, from: &str, to: &str) -> bool {
        let mut learner = self.inner.learner.lock();
        if !learner.record(from, to) {
            return false;
        }
        self.inner.writer.submit(learner.records());
        true
    }

    /// Waits until every recorded navigation has been handed to the store.
    pub async fn flush_patterns(&self) {
        self.inner.writer.flush().await;
    }

    /// Ranked likely next routes after `from`.
    pub fn predict(&self, from: &str) -> Vec<Prediction> {
        let config = &self.inner.config;
        self.inner
            .learner
            .lock()
            .predict(from, config.prediction_threshold, config.max_predictions)
    }

    // == Preload Likely Next Routes ==
    /// Starts warming the routes likely to follow `from` and returns at once.
    pub fn preload_likely_next_routes(&self, from: &str) -> SpeculativePreload {
        let predictions = self.predict(from);
        let routes: Vec<RouteKey> = predictions
            .iter()
            .map(|p| p.route.clone())
            .filter(|route| !self.is_preloaded(route))
            .collect();

        if routes.is_empty() {
            return SpeculativePreload {
                predictions,
                task: None,
            };
        }

        debug!(from, ?routes, "speculatively preloading likely next routes");
        let engine = self.clone();
        let task = tokio::spawn(async move { engine.preload_routes(&routes).await });

        SpeculativePreload {
            predictions,
            task: Some(task),
        }
    }

    // == Stats ==
    /// Diagnostic snapshot. No side effects.
    pub fn get_cache_stats(&self) -> EngineStats {
        let in_flight_count = self.inner.in_flight.lock().len();
        let cache = self.inner.cache.lock().stats();
        let total_known_routes = self.inner.known_routes.read().len();
        let learned_patterns = self.inner.learner.lock().len();

        EngineStats {
            cached_count: cache.cached_count,
            in_flight_count,
            total_known_routes,
            eager_loading_complete: self.inner.eager_loading_complete.load(Ordering::Acquire),
            learned_patterns,
            hits: cache.hits,
            misses: cache.misses,
            evictions: cache.evictions,
            expirations: cache.expirations,
            hit_rate: cache.hit_rate(),
            network: self.network_class(),
        }
    }

    /// Current network reading.
    pub fn network_class(&self) -> NetworkClass {
        self.inner.signal.classify()
    }

    /// Known routes with neither a fresh module nor a running load, in key order.
    pub fn uncached_known_routes(&self) -> Vec<RouteKey> {
        let known = self.inner.known_routes.read().clone();
        let in_flight = self.inner.in_flight.lock();
        let cache = self.inner.cache.lock();

        known
            .into_iter()
            .filter(|route| !in_flight.contains(route) && !cache.has(route))
            .collect()
    }

    /// Drops every TTL-expired module. Returns how many were removed.
    pub fn purge_stale(&self) -> usize {
        self.inner.cache.lock().purge_stale()
    }

    /// Claims the one warm-up pass this engine gets.
    pub(crate) fn begin_warmup(&self) -> Result<()> {
        self.inner
            .warmup_started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| PreloadError::WarmupAlreadyStarted)
    }

    pub(crate) fn mark_eager_loading_complete(&self) {
        self.inner
            .eager_loading_complete
            .store(true, Ordering::Release);
        info!("Eager route loading complete");
    }
}

impl std::fmt::Debug for PreloadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadEngine")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
