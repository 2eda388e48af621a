//! Key-value settings sources consulted during credential resolution.
//!
//! Credential lookup favours a legacy key name over its current
//! counterpart, so chains are expressed as ordered key lists evaluated in
//! priority order. The first source hit wins even when its value is empty;
//! validation happens afterwards.

use std::collections::HashMap;

/// Legacy environment key carrying the ingestion token.
pub const LEGACY_TOKEN_KEY: &str = "LOGFERRY_TOKEN";
/// Current settings key carrying the ingestion token.
pub const TOKEN_KEY: &str = "Logferry.Token";
/// Legacy environment key carrying the HTTP-PUT account key.
pub const LEGACY_ACCOUNT_KEY_KEY: &str = "LOGFERRY_ACCOUNT_KEY";
/// Current settings key carrying the HTTP-PUT account key.
pub const ACCOUNT_KEY_KEY: &str = "Logferry.AccountKey";
/// Legacy environment key carrying the HTTP-PUT location.
pub const LEGACY_LOCATION_KEY: &str = "LOGFERRY_LOCATION";
/// Current settings key carrying the HTTP-PUT location.
pub const LOCATION_KEY: &str = "Logferry.Location";

/// Abstract source of configuration values.
///
/// The engine only ever reads individual keys; resolution of files, stores,
/// or other richer configuration systems belongs to the embedding
/// application.
pub trait SettingsSource: Send + Sync {
    /// Fetch the raw value for `key`, if the source knows it.
    fn get(&self, key: &str) -> Option<String>;
}

/// Settings backed by process environment variables.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvSettings;

impl SettingsSource for EnvSettings {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed in-memory settings, useful for tests and embedders that resolve
/// configuration themselves.
#[derive(Clone, Debug, Default)]
pub struct MemorySettings {
    values: HashMap<String, String>,
}

impl MemorySettings {
    /// Create an empty settings map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key-value pair, replacing any previous value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl SettingsSource for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Return the first value any key in `chain` resolves to.
///
/// A present-but-empty value still wins the chain; callers validate the
/// winning value separately.
pub(crate) fn lookup_chain(source: &dyn SettingsSource, chain: &[&str]) -> Option<String> {
    chain.iter().find_map(|key| source.get(key))
}
