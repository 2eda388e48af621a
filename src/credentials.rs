//! Credential resolution for token and HTTP-PUT modes.
//!
//! Resolution is a pure function of the configuration and a settings
//! source, so repeated invocations against unchanged inputs always yield
//! the same result. Failures are logged diagnostics, never errors: the
//! engine simply refuses to start its worker without valid credentials.

use log::warn;
use uuid::Uuid;

use crate::config::{ProtocolMode, ShipperConfig};
use crate::settings::{
    self, ACCOUNT_KEY_KEY, LEGACY_ACCOUNT_KEY_KEY, LEGACY_LOCATION_KEY, LEGACY_TOKEN_KEY,
    LOCATION_KEY, SettingsSource, TOKEN_KEY,
};

/// Credentials adopted for the lifetime of one engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DeliveryCredentials {
    /// Secret token prefixed to every frame.
    Token(String),
    /// Account key and location named in the one-time HTTP-PUT handshake.
    HttpPut {
        account_key: String,
        location: String,
    },
}

/// True when `value` is a well-formed 128-bit GUID string.
fn is_guid(value: &str) -> bool {
    Uuid::parse_str(value).is_ok()
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

/// Resolve credentials for the configured mode.
///
/// Relay mode bypasses credentials entirely and the engine never consults
/// this path for it.
pub(crate) fn resolve(
    config: &ShipperConfig,
    source: &dyn SettingsSource,
) -> Option<DeliveryCredentials> {
    match config.mode() {
        ProtocolMode::Token => resolve_token(config, source),
        ProtocolMode::HttpPut => resolve_http_put(config, source),
        ProtocolMode::Relay => None,
    }
}

fn resolve_token(config: &ShipperConfig, source: &dyn SettingsSource) -> Option<DeliveryCredentials> {
    if let Some(token) = config.token.as_deref()
        && is_guid(token)
    {
        return Some(DeliveryCredentials::Token(token.to_owned()));
    }
    match settings::lookup_chain(source, &[LEGACY_TOKEN_KEY, TOKEN_KEY]) {
        Some(token) if is_guid(&token) => Some(DeliveryCredentials::Token(token)),
        _ => {
            warn!(
                "logferry: no valid token configured or found under {LEGACY_TOKEN_KEY}/{TOKEN_KEY}; nothing will be sent"
            );
            None
        }
    }
}

fn resolve_http_put(
    config: &ShipperConfig,
    source: &dyn SettingsSource,
) -> Option<DeliveryCredentials> {
    let account_key = config
        .account_key
        .as_deref()
        .filter(|key| is_guid(key))
        .map(str::to_owned)
        .or_else(|| {
            settings::lookup_chain(source, &[LEGACY_ACCOUNT_KEY_KEY, ACCOUNT_KEY_KEY])
                .filter(|key| is_guid(key))
        });
    let Some(account_key) = account_key else {
        warn!(
            "logferry: no valid account key configured or found under {LEGACY_ACCOUNT_KEY_KEY}/{ACCOUNT_KEY_KEY}; nothing will be sent"
        );
        return None;
    };

    // Location is looked up only once a valid account key exists.
    let location = config
        .location
        .clone()
        .and_then(non_empty)
        .or_else(|| {
            settings::lookup_chain(source, &[LEGACY_LOCATION_KEY, LOCATION_KEY]).and_then(non_empty)
        });
    let Some(location) = location else {
        warn!(
            "logferry: no location configured or found under {LEGACY_LOCATION_KEY}/{LOCATION_KEY}; nothing will be sent"
        );
        return None;
    };

    Some(DeliveryCredentials::HttpPut {
        account_key,
        location,
    })
}
