//! Capped, jittered exponential backoff for reconnect attempts.

use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Delay after the first failed open, before jitter.
pub const BACKOFF_MIN: Duration = Duration::from_millis(100);
/// Upper bound on the un-jittered delay.
pub const BACKOFF_MAX: Duration = Duration::from_millis(10_000);

/// Tracks the reconnect delay across a failure sequence.
///
/// The delay doubles on each failure, capped at [`BACKOFF_MAX`], and every
/// sleep adds uniform jitter in `[0, delay)`. A successful open resets the
/// sequence to [`BACKOFF_MIN`].
pub(crate) struct ReconnectBackoff {
    current: Duration,
    rng: StdRng,
}

impl ReconnectBackoff {
    pub(crate) fn new() -> Self {
        Self {
            current: BACKOFF_MIN,
            rng: StdRng::from_entropy(),
        }
    }

    /// Advance the sequence after a failure and return the jittered sleep.
    pub(crate) fn next_sleep(&mut self) -> Duration {
        self.current = self.current.saturating_mul(2).min(BACKOFF_MAX);
        let delay_ms = self.current.as_millis() as u64;
        let jitter_ms = self.rng.gen_range(0..delay_ms);
        Duration::from_millis(delay_ms + jitter_ms)
    }

    /// Reset to the minimum delay after a successful open.
    pub(crate) fn reset(&mut self) {
        self.current = BACKOFF_MIN;
    }

    #[cfg(test)]
    pub(crate) fn current(&self) -> Duration {
        self.current
    }
}
