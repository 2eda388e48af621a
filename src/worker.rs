//! The single-consumer delivery worker.
//!
//! One worker thread exists per engine. It opens the connection once at
//! start, resolves the line prefix exactly once, then loops: take an entry
//! or a cancellation signal, frame the entry, and write-and-flush it,
//! reconnecting with backoff on any transport failure. A payload is never
//! dropped because of a transient failure; only cancellation abandons it.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, select};

use crate::cancel::CancelToken;
use crate::config::ShipperConfig;
use crate::connection::ConnectionManager;
use crate::diag::debug_trace;
use crate::{frame, prefix};

/// Everything the worker thread owns.
pub(crate) struct WorkerContext {
    pub(crate) entries: Receiver<String>,
    pub(crate) cancel: CancelToken,
    pub(crate) connection: ConnectionManager,
    pub(crate) config: Arc<ShipperConfig>,
    /// Token prefixed to each frame; `None` outside token mode.
    pub(crate) token: Option<String>,
    /// Dropped on exit so shutdown can join with a bounded wait.
    pub(crate) done: Sender<()>,
}

pub(crate) fn run(ctx: WorkerContext) {
    let WorkerContext {
        entries,
        cancel,
        mut connection,
        config,
        token,
        done: _done,
    } = ctx;
    let debug = config.debug;

    if cancel.is_cancelled() {
        return;
    }
    if connection.reopen(&cancel).is_err() {
        return;
    }
    let prefix = prefix::build(&config);
    debug_trace!(debug, "logferry: delivery worker running, prefix {prefix:?}");

    loop {
        select! {
            recv(entries) -> entry => match entry {
                Ok(line) => {
                    if !deliver(&mut connection, &cancel, &prefix, token.as_deref(), &line, debug) {
                        return;
                    }
                }
                // All producers are gone; nothing more will arrive.
                Err(_) => return,
            },
            recv(cancel.receiver()) -> _ => {
                debug_trace!(debug, "logferry: delivery worker cancelled");
                return;
            }
        }
    }
}

/// Write one entry, reconnecting until it lands or cancellation wins.
///
/// Returns false when the worker should exit.
fn deliver(
    connection: &mut ConnectionManager,
    cancel: &CancelToken,
    prefix: &str,
    token: Option<&str>,
    line: &str,
    debug: bool,
) -> bool {
    let payload = frame::build_frame(prefix, token, line).into_bytes();
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        match connection.send(&payload) {
            Ok(()) => return true,
            Err(err) => {
                debug_trace!(debug, "logferry: write failed, reconnecting: {err}");
                if connection.reopen(cancel).is_err() {
                    return false;
                }
            }
        }
    }
}
