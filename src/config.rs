//! Engine configuration assembled by [`ShipperBuilder`](crate::ShipperBuilder).
//!
//! The configuration is immutable once the engine exists: the builder is the
//! only writer, every component is a reader.

/// Maximum number of queued lines held per engine.
pub const QUEUE_CAPACITY: usize = 32_768;
/// Default ingest host targeted in token and HTTP-PUT modes.
pub const DEFAULT_INGEST_HOST: &str = "ingest.logferry.io";
/// Plain-TCP ingest port for token mode.
pub const TOKEN_PORT: u16 = 10_000;
/// TLS ingest port for token mode.
pub const TOKEN_TLS_PORT: u16 = 20_000;
/// Plain-TCP ingest port for HTTP-PUT mode.
pub const HTTP_PUT_PORT: u16 = 80;
/// TLS ingest port for HTTP-PUT mode.
pub const HTTP_PUT_TLS_PORT: u16 = 443;
/// Default port for relay mode when none is configured.
pub const DEFAULT_RELAY_PORT: u16 = 10_000;

/// Wire protocol selected by the configuration flags.
///
/// When flags conflict, relay wins over HTTP-PUT, which wins over token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolMode {
    /// Each frame is authenticated by a prefixed secret token.
    Token,
    /// A one-time handshake names the account key and location, then frames
    /// stream without a token.
    HttpPut,
    /// Frames go to a directly configured relay endpoint; no credentials.
    Relay,
}

/// Immutable-after-build field set read by every engine component.
#[derive(Clone, Debug)]
pub struct ShipperConfig {
    pub token: Option<String>,
    pub account_key: Option<String>,
    pub location: Option<String>,
    pub use_http_put: bool,
    pub use_ssl: bool,
    pub use_data_hub: bool,
    pub data_hub_address: Option<String>,
    pub data_hub_port: u16,
    pub use_host_name: bool,
    pub host_name: Option<String>,
    pub log_id: Option<String>,
    pub debug: bool,
    /// Ingest host override for token and HTTP-PUT modes.
    pub endpoint_host: String,
}

impl Default for ShipperConfig {
    fn default() -> Self {
        Self {
            token: None,
            account_key: None,
            location: None,
            use_http_put: false,
            use_ssl: false,
            use_data_hub: false,
            data_hub_address: None,
            data_hub_port: DEFAULT_RELAY_PORT,
            use_host_name: false,
            host_name: None,
            log_id: None,
            debug: false,
            endpoint_host: DEFAULT_INGEST_HOST.to_string(),
        }
    }
}

impl ShipperConfig {
    /// Resolve the protocol mode from the configured flags.
    pub fn mode(&self) -> ProtocolMode {
        if self.use_data_hub {
            ProtocolMode::Relay
        } else if self.use_http_put {
            ProtocolMode::HttpPut
        } else {
            ProtocolMode::Token
        }
    }

    /// Resolve the target host and port for the default transport.
    pub fn endpoint(&self) -> (String, u16) {
        match self.mode() {
            ProtocolMode::Relay => (
                self.data_hub_address.clone().unwrap_or_default(),
                self.data_hub_port,
            ),
            ProtocolMode::HttpPut => (
                self.endpoint_host.clone(),
                if self.use_ssl {
                    HTTP_PUT_TLS_PORT
                } else {
                    HTTP_PUT_PORT
                },
            ),
            ProtocolMode::Token => (
                self.endpoint_host.clone(),
                if self.use_ssl { TOKEN_TLS_PORT } else { TOKEN_PORT },
            ),
        }
    }
}
