//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use route_preload::cache::ModuleHandle;
use route_preload::patterns::TransitionRecord;
use route_preload::{
    ModuleLoader, NetworkClass, PatternStore, PreloadConfig, PreloadEngine, PreloadError,
    SharedNetworkSignal,
};

type LoadHook = Box<dyn Fn(&str) + Send + Sync>;

/// Loader that records every call and can fail, panic, stall or run a hook.
#[derive(Default)]
pub struct FakeLoader {
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
    panic_once: Mutex<HashSet<String>>,
    delay: Duration,
    on_load: Option<LoadHook>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, routes: &[&str]) -> Self {
        self.failing = routes.iter().map(|r| r.to_string()).collect();
        self
    }

    /// The first load of each route in `routes` panics.
    pub fn panicking_once(self, routes: &[&str]) -> Self {
        *self.panic_once.lock() = routes.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Runs `hook` with the route before each load resolves.
    pub fn on_load(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_load = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, route: &str) -> usize {
        self.calls.lock().iter().filter(|r| *r == route).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ModuleLoader for FakeLoader {
    async fn load(&self, route: &str) -> anyhow::Result<ModuleHandle> {
        self.calls.lock().push(route.to_string());

        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }

        let panics = self.panic_once.lock().remove(route);
        if panics {
            panic!("loader blew up on {}", route);
        }
        if let Some(hook) = &self.on_load {
            hook(route);
        }
        if self.failing.contains(route) {
            anyhow::bail!("chunk for {} not found", route);
        }
        Ok(Arc::new(format!("module:{}", route)))
    }
}

/// Store whose every read and write fails.
pub struct FailingPatternStore;

impl PatternStore for FailingPatternStore {
    fn read(&self) -> route_preload::Result<Vec<TransitionRecord>> {
        Err(PreloadError::Persistence("storage unavailable".to_string()))
    }

    fn write(&self, _records: &[TransitionRecord]) -> route_preload::Result<()> {
        Err(PreloadError::Persistence("storage unavailable".to_string()))
    }
}

/// Store whose writes block the calling thread.
pub struct SlowPatternStore {
    delay: Duration,
    writes: AtomicUsize,
    last: Mutex<Vec<TransitionRecord>>,
}

impl SlowPatternStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            writes: AtomicUsize::new(0),
            last: Mutex::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn last_written(&self) -> Vec<TransitionRecord> {
        self.last.lock().clone()
    }
}

impl PatternStore for SlowPatternStore {
    fn read(&self) -> route_preload::Result<Vec<TransitionRecord>> {
        Ok(Vec::new())
    }

    fn write(&self, records: &[TransitionRecord]) -> route_preload::Result<()> {
        std::thread::sleep(self.delay);
        *self.last.lock() = records.to_vec();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn signal(class: NetworkClass) -> Arc<SharedNetworkSignal> {
    Arc::new(SharedNetworkSignal::new(class))
}

pub fn engine_with(
    config: PreloadConfig,
    loader: Arc<FakeLoader>,
    signal: Arc<SharedNetworkSignal>,
    store: Arc<dyn PatternStore>,
) -> PreloadEngine {
    PreloadEngine::new(config, loader, signal, store)
}

pub fn routes(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}
