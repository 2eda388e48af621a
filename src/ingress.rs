//! Bounded ingress queue with drop-oldest overflow.
//!
//! Producers only ever touch [`IngressQueue::push`], which is O(1) and
//! never blocks: when the queue is full it evicts exactly one oldest entry
//! and retries the insert once, so the queue always holds the N
//! most-recently-offered lines. A line lost to sustained overflow is
//! recorded through the rate-limited drop warner.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::diag::DropWarner;
use crate::frame;

/// Bounded MPSC FIFO of trimmed log lines.
///
/// Built on a crossbeam channel; channels are MPMC, so producer-side
/// eviction is just a competing receive against the worker.
pub(crate) struct IngressQueue {
    tx: Sender<String>,
    rx: Receiver<String>,
    warner: DropWarner,
}

impl IngressQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            tx,
            rx,
            warner: DropWarner::new(),
        }
    }

    /// Offer a line; trailing CR/LF is stripped before storage.
    ///
    /// Never blocks and never reports failure to the caller.
    pub(crate) fn push(&self, line: &str) {
        let entry = frame::trim_line_ending(line).to_owned();
        let entry = match self.tx.try_send(entry) {
            Ok(()) => return,
            Err(TrySendError::Full(entry)) => entry,
            Err(TrySendError::Disconnected(_)) => return,
        };
        // Evict the oldest entry, then retry once; ties favour the new line.
        let _ = self.rx.try_recv();
        if self.tx.try_send(entry).is_err() {
            self.warner.record_drop();
        }
    }

    /// Warn immediately about drops still pending in the rate-limit window.
    ///
    /// Called at shutdown so the final tally is not lost. Returns the tally
    /// emitted, if any.
    pub(crate) fn flush_drop_warnings(&self) -> Option<u64> {
        self.warner.flush()
    }

    /// Consumer handle for the delivery worker.
    pub(crate) fn receiver(&self) -> Receiver<String> {
        self.rx.clone()
    }

    /// Depth probe for the queue registry.
    pub(crate) fn probe(&self) -> DepthProbe {
        DepthProbe {
            rx: self.rx.clone(),
        }
    }
}

/// Read-only view of a queue's fill level.
#[derive(Clone)]
pub struct DepthProbe {
    rx: Receiver<String>,
}

impl DepthProbe {
    /// Number of entries currently queued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &IngressQueue) -> Vec<String> {
        let rx = queue.receiver();
        let mut entries = Vec::new();
        while let Ok(entry) = rx.try_recv() {
            entries.push(entry);
        }
        entries
    }

    #[test]
    fn preserves_fifo_order() {
        let queue = IngressQueue::with_capacity(8);
        queue.push("one");
        queue.push("two");
        queue.push("three");
        assert_eq!(drain(&queue), ["one", "two", "three"]);
    }

    #[test]
    fn strips_trailing_line_endings() {
        let queue = IngressQueue::with_capacity(8);
        queue.push("line\r\n");
        assert_eq!(drain(&queue), ["line"]);
    }

    #[test]
    fn evicts_the_oldest_entry_at_capacity() {
        let capacity = 4;
        let queue = IngressQueue::with_capacity(capacity);
        for i in 1..=capacity + 1 {
            queue.push(&format!("L{i}"));
        }
        assert_eq!(drain(&queue), ["L2", "L3", "L4", "L5"]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let queue = IngressQueue::with_capacity(4);
        for i in 0..100 {
            queue.push(&format!("L{i}"));
            assert!(queue.probe().len() <= 4);
        }
        assert_eq!(drain(&queue), ["L96", "L97", "L98", "L99"]);
    }

    #[test]
    fn full_capacity_queue_evicts_exactly_the_oldest_entry() {
        let capacity = crate::config::QUEUE_CAPACITY;
        let queue = IngressQueue::with_capacity(capacity);
        for i in 1..=capacity + 1 {
            queue.push(&format!("L{i}"));
        }
        let entries = drain(&queue);
        assert_eq!(entries.len(), capacity);
        assert_eq!(entries.first().map(String::as_str), Some("L2"));
        assert_eq!(
            entries.last().map(String::as_str),
            Some(format!("L{}", capacity + 1).as_str())
        );
    }

    #[test]
    fn shutdown_flush_reports_drops_from_the_last_warn_window() {
        // Zero capacity makes every push drop, standing in for sustained
        // overflow where the evict-and-retry insert loses the race.
        let queue = IngressQueue::with_capacity(0);
        queue.push("first");
        queue.push("second");
        queue.push("third");
        // The first drop warned immediately; the rest are still pending
        // inside the rate-limit window and must surface on flush.
        assert_eq!(queue.flush_drop_warnings(), Some(2));
        assert_eq!(queue.flush_drop_warnings(), None);
    }

    #[test]
    fn probe_tracks_depth() {
        let queue = IngressQueue::with_capacity(8);
        let probe = queue.probe();
        assert!(probe.is_empty());
        queue.push("a");
        queue.push("b");
        assert_eq!(probe.len(), 2);
        drain(&queue);
        assert!(probe.is_empty());
    }
}
