//! Builder for [`Shipper`].
//!
//! Validates structural configuration only: a relay endpoint must exist,
//! ports must be non-zero, the ingest host must not be blank. Credential
//! content is never a build error; invalid credentials surface at runtime
//! as a logged diagnostic and a worker that never starts.

use thiserror::Error;

use crate::config::ShipperConfig;
use crate::registry::QueueRegistry;
use crate::settings::{EnvSettings, SettingsSource};
use crate::shipper::Shipper;
use crate::transport::{TcpTransportFactory, TlsOptions, TransportFactory};

/// Errors that may occur while building a shipper.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid user supplied configuration.
    #[error("invalid shipper configuration: {0}")]
    InvalidConfig(String),
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(BuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

/// Fluent construction of a [`Shipper`].
pub struct ShipperBuilder {
    config: ShipperConfig,
    settings: Option<Box<dyn SettingsSource>>,
    registry: Option<QueueRegistry>,
    factory: Option<Box<dyn TransportFactory>>,
}

impl ShipperBuilder {
    pub fn new() -> Self {
        Self {
            config: ShipperConfig::default(),
            settings: None,
            registry: None,
            factory: None,
        }
    }

    /// Authentication token for token mode.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    /// Account key for HTTP-PUT mode.
    pub fn with_account_key(mut self, account_key: impl Into<String>) -> Self {
        self.config.account_key = Some(account_key.into());
        self
    }

    /// Location for HTTP-PUT mode.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.config.location = Some(location.into());
        self
    }

    /// Switch framing and handshake to HTTP-PUT mode.
    pub fn with_http_put(mut self, enabled: bool) -> Self {
        self.config.use_http_put = enabled;
        self
    }

    /// Use TLS on the default transport.
    pub fn with_ssl(mut self, enabled: bool) -> Self {
        self.config.use_ssl = enabled;
        self
    }

    /// Relay mode: bypass credentials and target `address:port` directly.
    pub fn with_data_hub(mut self, address: impl Into<String>, port: u16) -> Self {
        self.config.use_data_hub = true;
        self.config.data_hub_address = Some(address.into());
        self.config.data_hub_port = port;
        self
    }

    /// Enable or disable host-name line prefixing.
    pub fn with_host_name_prefix(mut self, enabled: bool) -> Self {
        self.config.use_host_name = enabled;
        self
    }

    /// Explicit host name for the prefix; implies host-name prefixing.
    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.config.host_name = Some(host_name.into());
        self.config.use_host_name = true;
        self
    }

    /// Log identifier prepended to every frame.
    pub fn with_log_id(mut self, log_id: impl Into<String>) -> Self {
        self.config.log_id = Some(log_id.into());
        self
    }

    /// Enable diagnostic tracing of internal state transitions.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// Override the ingest host for token and HTTP-PUT modes.
    pub fn with_endpoint(mut self, host: impl Into<String>) -> Self {
        self.config.endpoint_host = host.into();
        self
    }

    /// Inject a settings source; defaults to process environment variables.
    pub fn with_settings(mut self, settings: impl SettingsSource + 'static) -> Self {
        self.settings = Some(Box::new(settings));
        self
    }

    /// Inject a queue registry; defaults to [`QueueRegistry::global`].
    pub fn with_registry(mut self, registry: QueueRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Inject a transport factory; defaults to the TCP(+TLS) transport
    /// targeting the configured endpoint.
    pub fn with_transport_factory(mut self, factory: impl TransportFactory + 'static) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Validate the configuration and construct the shipper.
    pub fn build(self) -> Result<Shipper, BuildError> {
        let Self {
            config,
            settings,
            registry,
            factory,
        } = self;

        if config.use_data_hub {
            let address = config.data_hub_address.as_deref().unwrap_or_default();
            if address.trim().is_empty() {
                return Err(BuildError::InvalidConfig(
                    "relay mode requires a data hub address".into(),
                ));
            }
            ensure_positive!(config.data_hub_port, "data hub port")?;
        }
        if config.endpoint_host.trim().is_empty() {
            return Err(BuildError::InvalidConfig(
                "endpoint host must not be blank".into(),
            ));
        }

        let factory = factory.unwrap_or_else(|| default_factory(&config));
        let settings = settings.unwrap_or_else(|| Box::new(EnvSettings));
        let registry = registry.unwrap_or_else(QueueRegistry::global);
        Ok(Shipper::from_parts(config, settings, registry, factory))
    }
}

impl Default for ShipperBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_factory(config: &ShipperConfig) -> Box<dyn TransportFactory> {
    let (host, port) = config.endpoint();
    let tls = config.use_ssl.then(|| TlsOptions {
        domain: host.clone(),
        insecure_skip_verify: false,
    });
    Box::new(TcpTransportFactory::new(host, port, tls))
}
