//! Connection lifecycle: open, reopen with backoff, close.

use std::io;

use crate::backoff::ReconnectBackoff;
use crate::cancel::CancelToken;
use crate::diag::debug_trace;
use crate::transport::{Transport, TransportFactory};

/// Lifecycle state of the engine's single connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Raised when cancellation interrupts a blocking reconnect loop.
#[derive(Debug)]
pub(crate) struct Cancelled;

/// Sole owner of the transport instance.
///
/// Exactly one transport exists per engine; it is built lazily on the
/// first open and retained across close/reopen cycles.
pub(crate) struct ConnectionManager {
    factory: Box<dyn TransportFactory>,
    transport: Option<Box<dyn Transport>>,
    state: ConnectionState,
    backoff: ReconnectBackoff,
    handshake: Option<Vec<u8>>,
    debug: bool,
}

impl ConnectionManager {
    pub(crate) fn new(
        factory: Box<dyn TransportFactory>,
        handshake: Option<Vec<u8>>,
        debug: bool,
    ) -> Self {
        Self {
            factory,
            transport: None,
            state: ConnectionState::Disconnected,
            backoff: ReconnectBackoff::new(),
            handshake,
            debug,
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connect and, in HTTP-PUT mode, write the one-time handshake.
    pub(crate) fn open(&mut self) -> io::Result<()> {
        self.state = ConnectionState::Connecting;
        match self.try_open() {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(err) => {
                self.state = ConnectionState::Disconnected;
                Err(io::Error::new(
                    err.kind(),
                    format!("opening connection: {err}"),
                ))
            }
        }
    }

    fn try_open(&mut self) -> io::Result<()> {
        let factory = &self.factory;
        let transport = self.transport.get_or_insert_with(|| factory.create());
        transport.connect()?;
        if let Some(handshake) = &self.handshake {
            transport.write(handshake)?;
            transport.flush()?;
        }
        Ok(())
    }

    /// Close, then retry `open` with capped jittered backoff until it
    /// succeeds or cancellation interrupts the loop. Never gives up on its
    /// own.
    pub(crate) fn reopen(&mut self, cancel: &CancelToken) -> Result<(), Cancelled> {
        self.close();
        loop {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }
            match self.open() {
                Ok(()) => {
                    self.backoff.reset();
                    debug_trace!(self.debug, "logferry: connection established");
                    return Ok(());
                }
                Err(err) => {
                    debug_trace!(self.debug, "logferry: connect failed, backing off: {err}");
                    let delay = self.backoff.next_sleep();
                    if !cancel.sleep(delay) {
                        return Err(Cancelled);
                    }
                }
            }
        }
    }

    /// Release the active connection. Idempotent.
    pub(crate) fn close(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            transport.close();
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Write the whole payload and flush it to the wire.
    pub(crate) fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        let Some(transport) = self.transport.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "no open transport",
            ));
        };
        transport.write(payload)?;
        transport.flush()
    }
}
