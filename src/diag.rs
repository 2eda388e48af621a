//! Rate-limited drop diagnostics and debug-gated state tracing.
//!
//! Dropped-line warnings are coalesced so a sustained overflow does not
//! flood the host application's own log output. State-transition tracing
//! is emitted through [`log::debug!`] and only when the engine was built
//! with the `debug` flag set.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;

/// How often to emit warnings about dropped log lines.
pub(crate) const WARN_RATE_LIMIT_SECS: u64 = 5;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Coalesces dropped-line warnings for the ingress queue.
///
/// [`record_drop`](Self::record_drop) counts a lost line and warns with
/// the accumulated tally at most once per [`WARN_RATE_LIMIT_SECS`];
/// [`flush`](Self::flush) warns immediately about anything still pending,
/// so drops inside the last window are not lost at shutdown. Both return
/// the tally they emitted, if any.
#[derive(Default)]
pub(crate) struct DropWarner {
    last_warn: AtomicU64,
    dropped: AtomicU64,
}

impl DropWarner {
    /// Create a new [`DropWarner`]. The first warning can be emitted
    /// immediately.
    pub(crate) fn new() -> Self {
        Self {
            last_warn: AtomicU64::new(now_secs().saturating_sub(WARN_RATE_LIMIT_SECS)),
            dropped: AtomicU64::new(0),
        }
    }

    /// Count one dropped line, warning if the rate limit allows.
    pub(crate) fn record_drop(&self) -> Option<u64> {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        self.warn_if_due_at(now_secs())
    }

    /// Warn immediately about any still-pending drops.
    pub(crate) fn flush(&self) -> Option<u64> {
        self.warn_pending_at(now_secs())
    }

    fn warn_if_due_at(&self, now: u64) -> Option<u64> {
        let prev = self.last_warn.load(Ordering::Relaxed);
        if now.saturating_sub(prev) < WARN_RATE_LIMIT_SECS {
            return None;
        }
        self.warn_pending_at(now)
    }

    fn warn_pending_at(&self, now: u64) -> Option<u64> {
        let count = self.dropped.swap(0, Ordering::Relaxed);
        if count == 0 {
            return None;
        }
        self.last_warn.store(now, Ordering::Relaxed);
        warn!("logferry: ingress queue full; dropped {count} lines");
        Some(count)
    }
}

/// Emit a [`log::debug!`] record only when diagnostic tracing is enabled.
macro_rules! debug_trace {
    ($enabled:expr, $($arg:tt)*) => {
        if $enabled {
            log::debug!($($arg)*);
        }
    };
}

pub(crate) use debug_trace;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_the_first_warning_immediately() {
        let warner = DropWarner::new();
        assert_eq!(warner.record_drop(), Some(1));
    }

    #[test]
    fn rate_limits_warnings_inside_the_window() {
        let warner = DropWarner::new();
        assert_eq!(warner.record_drop(), Some(1));
        assert_eq!(warner.record_drop(), None);
        assert_eq!(warner.record_drop(), None);
    }

    #[test]
    fn warns_again_with_the_tally_once_the_window_elapses() {
        // Default leaves last_warn at zero, so mock timestamps stay small.
        let warner = DropWarner::default();
        warner.dropped.store(3, Ordering::Relaxed);
        let base = 1_000;
        assert_eq!(warner.warn_if_due_at(base), Some(3));
        warner.dropped.store(2, Ordering::Relaxed);
        assert_eq!(warner.warn_if_due_at(base + WARN_RATE_LIMIT_SECS - 1), None);
        assert_eq!(warner.warn_if_due_at(base + WARN_RATE_LIMIT_SECS), Some(2));
    }

    #[test]
    fn flush_emits_drops_pending_inside_the_window() {
        let warner = DropWarner::new();
        assert_eq!(warner.record_drop(), Some(1));
        assert_eq!(warner.record_drop(), None);
        assert_eq!(warner.record_drop(), None);
        assert_eq!(warner.flush(), Some(2));
    }

    #[test]
    fn flush_is_silent_without_drops() {
        let warner = DropWarner::new();
        assert_eq!(warner.flush(), None);
        warner.record_drop();
        warner.flush();
        assert_eq!(warner.flush(), None);
    }
}
