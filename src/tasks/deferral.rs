//! Deferred execution for the warm-up phases.
//!
//! The high-priority phase waits for the host's first paint and the
//! background phase for its idle time. Hosts that cannot report idle time
//! get a fixed delay instead; tests use `Immediate`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

// == Deferral ==
/// When the deferred warm-up phases may start.
#[async_trait]
pub trait Deferral: Send + Sync {
    /// Resolves once the host has painted its first frame.
    async fn after_first_paint(&self);

    /// Resolves once the host is idle.
    async fn until_idle(&self);
}

// == Host Lifecycle ==
/// Idle-priority deferral driven by host notifications.
#[derive(Debug)]
pub struct HostLifecycle {
    painted: watch::Sender<bool>,
    idle: watch::Sender<bool>,
}

impl HostLifecycle {
    pub fn new() -> Self {
        let (painted, _) = watch::channel(false);
        let (idle, _) = watch::channel(false);
        Self { painted, idle }
    }

    /// Host reports its first paint. Later calls are no-ops.
    pub fn mark_painted(&self) {
        self.painted.send_replace(true);
    }

    /// Host reports idle time. Idle implies painted.
    pub fn mark_idle(&self) {
        self.painted.send_replace(true);
        self.idle.send_replace(true);
    }

    pub fn is_painted(&self) -> bool {
        *self.painted.borrow()
    }

    pub fn is_idle(&self) -> bool {
        *self.idle.borrow()
    }
}

impl Default for HostLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Deferral for HostLifecycle {
    async fn after_first_paint(&self) {
        let mut rx = self.painted.subscribe();
        // The sender lives in self, so the channel cannot close here
        let _ = rx.wait_for(|painted| *painted).await;
    }

    async fn until_idle(&self) {
        let mut rx = self.idle.subscribe();
        let _ = rx.wait_for(|idle| *idle).await;
    }
}

// == Fixed Delay ==
/// Fallback for hosts without an idle signal: paint is assumed once the
/// runtime yields, idle after a fixed delay.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    idle_delay: Duration,
}

impl FixedDelay {
    pub fn new(idle_delay: Duration) -> Self {
        Self { idle_delay }
    }
}

#[async_trait]
impl Deferral for FixedDelay {
    async fn after_first_paint(&self) {
        tokio::task::yield_now().await;
    }

    async fn until_idle(&self) {
        debug!(
            delay_ms = self.idle_delay.as_millis() as u64,
            "no idle signal, waiting fixed delay"
        );
        tokio::time::sleep(self.idle_delay).await;
    }
}

// == Immediate ==
/// Runs every phase back to back.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

#[async_trait]
impl Deferral for Immediate {
    async fn after_first_paint(&self) {}

    async fn until_idle(&self) {}
}

/// Picks the idle-priority deferral when the host can signal idle time,
/// the fixed-delay fallback otherwise.
pub fn select_deferral(
    host: Option<Arc<HostLifecycle>>,
    idle_fallback_delay: Duration,
) -> Arc<dyn Deferral> {
    match host {
        Some(host) => host as Arc<dyn Deferral>,
        None => Arc::new(FixedDelay::new(idle_fallback_delay)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_host_lifecycle_waits_for_signals() {
        let host = Arc::new(HostLifecycle::new());
        let waiter = {
            let host = host.clone();
            tokio::spawn(async move {
                host.after_first_paint().await;
                host.until_idle().await;
            })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        host.mark_painted();
        assert!(host.is_painted());
        assert!(!host.is_idle());

        host.mark_idle();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_signal_before_wait_is_not_lost() {
        let host = HostLifecycle::new();
        host.mark_idle();

        // Both resolve immediately
        host.after_first_paint().await;
        host.until_idle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_waits() {
        let deferral = FixedDelay::new(Duration::from_millis(2000));
        let start = tokio::time::Instant::now();

        deferral.after_first_paint().await;
        deferral.until_idle().await;

        assert!(start.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_deferral_falls_back() {
        let deferral = select_deferral(None, Duration::from_millis(500));
        let start = tokio::time::Instant::now();
        deferral.until_idle().await;
        assert!(start.elapsed() >= Duration::from_millis(500));

        let host = Arc::new(HostLifecycle::new());
        host.mark_idle();
        let deferral = select_deferral(Some(host), Duration::from_secs(3600));
        let start = tokio::time::Instant::now();
        deferral.until_idle().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
