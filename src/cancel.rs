//! Cooperative cancellation shared between the engine facade and its worker.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use parking_lot::Mutex;

/// Cancellation token observable from `select!` arms and timed waits.
///
/// Cancelling drops the internal sender, which disconnects the receiver:
/// every pending and future wait on it wakes immediately, without a message
/// ever being consumed. Nothing is sent on the channel.
#[derive(Clone)]
pub(crate) struct CancelToken {
    flag: Arc<AtomicBool>,
    guard: Arc<Mutex<Option<Sender<()>>>>,
    rx: Receiver<()>,
}

impl CancelToken {
    pub(crate) fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            guard: Arc::new(Mutex::new(Some(tx))),
            rx,
        }
    }

    /// Signal cancellation. Idempotent.
    pub(crate) fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.guard.lock().take();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Receiver for use in `select!`; becomes ready once cancelled.
    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }

    /// Sleep for `duration`, waking early on cancellation.
    ///
    /// Returns `false` when the wait was interrupted by cancellation.
    pub(crate) fn sleep(&self, duration: Duration) -> bool {
        matches!(self.rx.recv_timeout(duration), Err(RecvTimeoutError::Timeout))
    }
}
