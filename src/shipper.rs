//! Engine facade: non-blocking ingestion and worker lifecycle.

use std::sync::{Arc, Once};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use parking_lot::Mutex;

use crate::cancel::CancelToken;
use crate::config::{ProtocolMode, QUEUE_CAPACITY, ShipperConfig};
use crate::connection::ConnectionManager;
use crate::credentials::{self, DeliveryCredentials};
use crate::frame;
use crate::ingress::IngressQueue;
use crate::registry::QueueRegistry;
use crate::settings::SettingsSource;
use crate::transport::TransportFactory;
use crate::worker::{self, WorkerContext};

/// How long shutdown waits for the worker to acknowledge cancellation.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Lifecycle of the delivery worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerRunState {
    NotStarted,
    Running,
    Cancelled,
}

/// Asynchronous, best-effort shipper of log lines.
///
/// Producers call [`add_line`](Self::add_line) from any thread; it never
/// blocks and never fails. A single worker thread is started lazily on the
/// first call and owns all network I/O. Delivery is best effort: lines may
/// be lost under sustained overflow or an unfinished shutdown.
pub struct Shipper {
    config: Arc<ShipperConfig>,
    settings: Box<dyn SettingsSource>,
    factory: Mutex<Option<Box<dyn TransportFactory>>>,
    queue: IngressQueue,
    start: Once,
    run_state: Mutex<WorkerRunState>,
    cancel: CancelToken,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    done: Mutex<Option<Receiver<()>>>,
}

impl Shipper {
    /// Start building a shipper.
    pub fn builder() -> crate::builder::ShipperBuilder {
        crate::builder::ShipperBuilder::new()
    }

    pub(crate) fn from_parts(
        config: ShipperConfig,
        settings: Box<dyn SettingsSource>,
        registry: QueueRegistry,
        factory: Box<dyn TransportFactory>,
    ) -> Self {
        let queue = IngressQueue::with_capacity(QUEUE_CAPACITY);
        registry.register(queue.probe());
        Self {
            config: Arc::new(config),
            settings,
            factory: Mutex::new(Some(factory)),
            queue,
            start: Once::new(),
            run_state: Mutex::new(WorkerRunState::NotStarted),
            cancel: CancelToken::new(),
            handle: Mutex::new(None),
            done: Mutex::new(None),
        }
    }

    /// Offer a line for delivery. Never blocks, never fails.
    ///
    /// The first call starts the delivery worker; concurrent first calls
    /// start it exactly once. With invalid credentials the worker never
    /// starts and lines queue under the overflow policy.
    pub fn add_line(&self, line: &str) {
        self.ensure_started();
        self.queue.push(line);
    }

    /// Current lifecycle state of the delivery worker.
    pub fn worker_state(&self) -> WorkerRunState {
        *self.run_state.lock()
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &ShipperConfig {
        &self.config
    }

    fn ensure_started(&self) {
        self.start.call_once(|| {
            // Holding the state lock while spawning closes the race with a
            // concurrent shutdown.
            let mut run_state = self.run_state.lock();
            if *run_state == WorkerRunState::Cancelled {
                return;
            }

            let credentials = match self.config.mode() {
                ProtocolMode::Relay => None,
                _ => match credentials::resolve(&self.config, self.settings.as_ref()) {
                    Some(credentials) => Some(credentials),
                    // Diagnostics already logged; lines keep queueing but
                    // nothing is ever sent.
                    None => return,
                },
            };
            let Some(factory) = self.factory.lock().take() else {
                return;
            };

            let handshake = match &credentials {
                Some(DeliveryCredentials::HttpPut {
                    account_key,
                    location,
                }) => Some(frame::handshake_line(account_key, location).into_bytes()),
                _ => None,
            };
            let token = match credentials {
                Some(DeliveryCredentials::Token(token)) => Some(token),
                _ => None,
            };

            let connection = ConnectionManager::new(factory, handshake, self.config.debug);
            let (done_tx, done_rx) = bounded(1);
            let ctx = WorkerContext {
                entries: self.queue.receiver(),
                cancel: self.cancel.clone(),
                connection,
                config: Arc::clone(&self.config),
                token,
                done: done_tx,
            };
            match thread::Builder::new()
                .name("logferry-delivery".into())
                .spawn(move || worker::run(ctx))
            {
                Ok(handle) => {
                    *self.handle.lock() = Some(handle);
                    *self.done.lock() = Some(done_rx);
                    *run_state = WorkerRunState::Running;
                }
                Err(err) => {
                    log::warn!("logferry: failed to spawn delivery worker: {err}");
                }
            }
        });
    }

    /// Request cooperative shutdown and wait briefly for the worker.
    ///
    /// Queued and in-flight entries are abandoned; callers needing drain
    /// assurance poll [`QueueRegistry::all_drained`] first.
    pub fn shutdown(&self) {
        {
            let mut run_state = self.run_state.lock();
            if *run_state == WorkerRunState::Cancelled {
                return;
            }
            *run_state = WorkerRunState::Cancelled;
        }
        self.cancel.cancel();
        // Surface any drop tally still inside the rate-limit window.
        self.queue.flush_drop_warnings();

        let done = self.done.lock().take();
        if let Some(done) = done
            && matches!(done.recv_timeout(SHUTDOWN_TIMEOUT), Err(RecvTimeoutError::Timeout))
        {
            log::warn!("logferry: delivery worker did not stop within {SHUTDOWN_TIMEOUT:?}");
            return;
        }
        if let Some(handle) = self.handle.lock().take()
            && handle.join().is_err()
        {
            log::warn!("logferry: delivery worker panicked");
        }
    }
}

impl Drop for Shipper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Shipper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shipper")
            .field("mode", &self.config.mode())
            .field("state", &self.worker_state())
            .finish()
    }
}
