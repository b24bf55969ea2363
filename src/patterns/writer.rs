//! Background persistence of the learned table.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::warn;

use crate::patterns::{PatternStore, TransitionRecord};

#[derive(Default)]
struct WriterState {
    /// Latest snapshot not yet written
    pending: Option<Vec<TransitionRecord>>,
    /// A drain is running on the blocking pool
    running: bool,
}

struct WriterShared {
    store: Arc<dyn PatternStore>,
    state: Mutex<WriterState>,
    idle: watch::Sender<bool>,
}

// == Pattern Writer ==
/// Writes table snapshots to a `PatternStore` off the caller's path.
///
/// Only the newest snapshot matters: one submitted while a write is running
/// replaces any older snapshot still queued. Writes run on tokio's blocking
/// pool; outside a runtime they happen inline.
pub struct PatternWriter {
    shared: Arc<WriterShared>,
}

impl PatternWriter {
    pub fn new(store: Arc<dyn PatternStore>) -> Self {
        let (idle, _) = watch::channel(true);
        Self {
            shared: Arc::new(WriterShared {
                store,
                state: Mutex::new(WriterState::default()),
                idle,
            }),
        }
    }

    /// Queues `records` for writing and returns at once.
    pub fn submit(&self, records: Vec<TransitionRecord>) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            write_snapshot(self.shared.store.as_ref(), &records);
            return;
        };

        let mut state = self.shared.state.lock();
        state.pending = Some(records);
        if state.running {
            return;
        }
        state.running = true;
        self.shared.idle.send_replace(false);
        drop(state);

        let shared = Arc::clone(&self.shared);
        handle.spawn_blocking(move || shared.drain());
    }

    /// Resolves once every submitted snapshot has been written.
    pub async fn flush(&self) {
        let mut rx = self.shared.idle.subscribe();
        // The sender lives in self, so the channel cannot close here
        let _ = rx.wait_for(|idle| *idle).await;
    }
}

impl WriterShared {
    fn drain(&self) {
        loop {
            let records = {
                let mut state = self.state.lock();
                match state.pending.take() {
                    Some(records) => records,
                    None => {
                        state.running = false;
                        self.idle.send_replace(true);
                        return;
                    }
                }
            };
            write_snapshot(self.store.as_ref(), &records);
        }
    }
}

fn write_snapshot(store: &dyn PatternStore, records: &[TransitionRecord]) {
    match panic::catch_unwind(AssertUnwindSafe(|| store.write(records))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Dropping navigation pattern update: {}", e),
        Err(_) => warn!("Dropping navigation pattern update: pattern store panicked"),
    }
}

impl std::fmt::Debug for PatternWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternWriter")
            .field("idle", &*self.shared.idle.borrow())
            .finish_non_exhaustive()
    }
}
