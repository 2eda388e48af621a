//! Process-wide registry of queue depth probes.
//!
//! The registry exists solely to answer a best-effort "is everything
//! drained" question before shutdown. It is append-only: engines register a
//! probe at construction and nothing is removed on drop. A cloneable
//! handle keeps it injectable, so tests work against isolated registries
//! instead of the process-wide default.

use std::sync::Arc;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::ingress::DepthProbe;

/// Interval between drain-check polls.
pub const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

static GLOBAL: Lazy<QueueRegistry> = Lazy::new(QueueRegistry::new);

/// Append-only set of queue depth probes.
#[derive(Clone, Default)]
pub struct QueueRegistry {
    probes: Arc<RwLock<Vec<DepthProbe>>>,
}

impl QueueRegistry {
    /// Create an isolated registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the process-wide registry.
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    /// Register a queue's depth probe. Probes are never removed.
    pub fn register(&self, probe: DepthProbe) {
        self.probes.write().push(probe);
    }

    fn drained(&self) -> bool {
        self.probes.read().iter().all(DepthProbe::is_empty)
    }

    /// Poll until every registered queue is empty or `max_wait` elapses.
    ///
    /// Returns true as soon as all queues are empty. Once the deadline is
    /// reached a final check decides the result, so a queue draining right
    /// at the deadline still counts.
    pub fn all_drained(&self, max_wait: Duration) -> bool {
        let deadline = Instant::now() + max_wait;
        loop {
            if self.drained() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return self.drained();
            }
            std::thread::sleep(DRAIN_POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl std::fmt::Debug for QueueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueRegistry")
            .field("probes", &self.probes.read().len())
            .finish()
    }
}
