//! Shared scripted transport for integration tests.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use logferry::{Transport, TransportFactory};

/// Everything the scripted transport observed, plus its failure script.
#[derive(Default)]
pub struct TransportLog {
    pub created: u32,
    pub connects: u32,
    pub closes: u32,
    pub flushes: u32,
    pub writes: Vec<Vec<u8>>,
    pub connect_failures_remaining: u32,
    pub write_failures_remaining: u32,
}

/// Factory handing out transports that record into a shared log.
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    log: Arc<Mutex<TransportLog>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes(count: u32) -> Self {
        let factory = Self::new();
        factory.log.lock().write_failures_remaining = count;
        factory
    }

    pub fn log(&self) -> Arc<Mutex<TransportLog>> {
        Arc::clone(&self.log)
    }

    /// All written bytes concatenated and decoded as UTF-8.
    pub fn written_string(&self) -> String {
        let log = self.log.lock();
        let bytes: Vec<u8> = log.writes.iter().flatten().copied().collect();
        String::from_utf8(bytes).expect("writes are valid UTF-8")
    }

    /// Poll until at least `count` writes landed or `timeout` elapses.
    pub fn wait_for_writes(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.log.lock().writes.len() >= count {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        self.log.lock().writes.len() >= count
    }
}

impl TransportFactory for ScriptedFactory {
    fn create(&self) -> Box<dyn Transport> {
        self.log.lock().created += 1;
        Box::new(ScriptedTransport {
            log: Arc::clone(&self.log),
        })
    }
}

pub struct ScriptedTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl Transport for ScriptedTransport {
    fn connect(&mut self) -> io::Result<()> {
        let mut log = self.log.lock();
        log.connects += 1;
        if log.connect_failures_remaining > 0 {
            log.connect_failures_remaining -= 1;
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "scripted"));
        }
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut log = self.log.lock();
        if log.write_failures_remaining > 0 {
            log.write_failures_remaining -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted"));
        }
        log.writes.push(buf.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.log.lock().flushes += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.log.lock().closes += 1;
    }
}
