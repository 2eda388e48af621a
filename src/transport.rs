//! Transport contract and the default TCP(+TLS) implementation.
//!
//! The engine treats every transport failure uniformly as "connection
//! lost"; the worker responds by reopening through the connection manager.

use std::{
    io::{self, Write},
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use native_tls::{TlsConnector, TlsStream};

/// Default connection timeout applied when establishing sockets.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default write timeout applied to socket writes.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect/write/flush/close capability consumed by the engine.
///
/// Implementations must be reusable: `connect` may be called again after a
/// failure or a `close`.
pub trait Transport: Send {
    /// Establish the connection, replacing any previous one.
    fn connect(&mut self) -> io::Result<()>;
    /// Write the whole buffer to the active connection.
    fn write(&mut self, buf: &[u8]) -> io::Result<()>;
    /// Flush buffered data to the wire.
    fn flush(&mut self) -> io::Result<()>;
    /// Tear down the active connection. Idempotent.
    fn close(&mut self);
}

/// Constructs the engine's single transport instance on demand.
pub trait TransportFactory: Send {
    fn create(&self) -> Box<dyn Transport>;
}

/// TLS connection options for the default transport.
#[derive(Clone, Debug)]
pub struct TlsOptions {
    /// Domain name presented during the TLS handshake.
    pub domain: String,
    /// Skip certificate validation when true (intended for tests).
    pub insecure_skip_verify: bool,
}

impl TlsOptions {
    fn connector(&self) -> io::Result<TlsConnector> {
        let mut builder = TlsConnector::builder();
        if self.insecure_skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        builder.build().map_err(io::Error::other)
    }
}

enum ActiveStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl ActiveStream {
    fn writer(&mut self) -> &mut dyn Write {
        match self {
            ActiveStream::Plain(stream) => stream,
            ActiveStream::Tls(stream) => stream.as_mut(),
        }
    }
}

/// Blocking TCP transport with optional TLS, the crate's default collaborator.
pub struct TcpTransport {
    host: String,
    port: u16,
    tls: Option<TlsOptions>,
    connect_timeout: Duration,
    write_timeout: Duration,
    stream: Option<ActiveStream>,
}

impl TcpTransport {
    pub fn new(host: impl Into<String>, port: u16, tls: Option<TlsOptions>) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            stream: None,
        }
    }

    /// Override the timeout applied while establishing the connection.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the timeout applied to socket writes.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    fn socket_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map(|iter| iter.collect())
    }

    fn connect_tcp(&self) -> io::Result<TcpStream> {
        for addr in self.socket_addrs()? {
            if let Ok(stream) = TcpStream::connect_timeout(&addr, self.connect_timeout) {
                stream.set_nonblocking(false)?;
                return Ok(stream);
            }
        }
        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("unable to connect to {}:{}", self.host, self.port),
        ))
    }

    fn active(&mut self) -> io::Result<&mut ActiveStream> {
        self.stream.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "transport is not connected")
        })
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> io::Result<()> {
        self.stream = None;
        let stream = self.connect_tcp()?;
        stream.set_write_timeout(Some(self.write_timeout))?;
        let active = if let Some(tls) = &self.tls {
            let connector = tls.connector()?;
            stream.set_read_timeout(Some(self.connect_timeout))?;
            let stream = connector
                .connect(&tls.domain, stream)
                .map_err(io::Error::other)?;
            stream.get_ref().set_read_timeout(None)?;
            ActiveStream::Tls(Box::new(stream))
        } else {
            ActiveStream::Plain(stream)
        };
        self.stream = Some(active);
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        self.active()?.writer().write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.active()?.writer().flush()
    }

    fn close(&mut self) {
        self.stream = None;
    }
}

/// Factory producing [`TcpTransport`] instances for a fixed endpoint.
#[derive(Clone, Debug)]
pub struct TcpTransportFactory {
    host: String,
    port: u16,
    tls: Option<TlsOptions>,
    connect_timeout: Duration,
    write_timeout: Duration,
}

impl TcpTransportFactory {
    pub fn new(host: impl Into<String>, port: u16, tls: Option<TlsOptions>) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Override the connect timeout applied to produced transports.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the write timeout applied to produced transports.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

impl TransportFactory for TcpTransportFactory {
    fn create(&self) -> Box<dyn Transport> {
        Box::new(
            TcpTransport::new(self.host.clone(), self.port, self.tls.clone())
                .with_connect_timeout(self.connect_timeout)
                .with_write_timeout(self.write_timeout),
        )
    }
}
