//! logferry: asynchronous, best-effort shipping of log lines over TCP/TLS.
//!
//! Producers hand already-formatted lines to [`Shipper::add_line`], which
//! never blocks and never fails. A single background worker owns the
//! network connection, delivers entries in FIFO order, and recovers from
//! connection loss with capped, jittered exponential backoff. Delivery is
//! best effort by design: under sustained overflow the queue drops its
//! oldest entries, and shutdown abandons whatever is still queued.
//!
//! ```no_run
//! use logferry::Shipper;
//!
//! let shipper = Shipper::builder()
//!     .with_token("2bfbea1e-10c3-4419-bdad-7e6435882e1f")
//!     .build()
//!     .expect("valid configuration");
//! shipper.add_line("application started");
//! ```

mod backoff;
mod builder;
mod cancel;
mod config;
mod connection;
mod credentials;
mod diag;
mod frame;
mod ingress;
mod prefix;
mod registry;
mod settings;
mod shipper;
mod transport;
mod worker;

pub use backoff::{BACKOFF_MAX, BACKOFF_MIN};
pub use builder::{BuildError, ShipperBuilder};
pub use config::{
    DEFAULT_INGEST_HOST, DEFAULT_RELAY_PORT, HTTP_PUT_PORT, HTTP_PUT_TLS_PORT, ProtocolMode,
    QUEUE_CAPACITY, ShipperConfig, TOKEN_PORT, TOKEN_TLS_PORT,
};
pub use connection::ConnectionState;
pub use frame::LINE_SEPARATOR;
pub use ingress::DepthProbe;
pub use registry::{DRAIN_POLL_INTERVAL, QueueRegistry};
pub use settings::{
    ACCOUNT_KEY_KEY, EnvSettings, LEGACY_ACCOUNT_KEY_KEY, LEGACY_LOCATION_KEY, LEGACY_TOKEN_KEY,
    LOCATION_KEY, MemorySettings, SettingsSource, TOKEN_KEY,
};
pub use shipper::{Shipper, WorkerRunState};
pub use transport::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_WRITE_TIMEOUT, TcpTransport, TcpTransportFactory, TlsOptions,
    Transport, TransportFactory,
};
