//! Connection string and driver property construction.

use crate::config::ConnectionSettings;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt::Write as _;

pub const CONNECTION_STRING_PREFIX: &str = "jdbc:firebirdsql:";

pub const PROP_SQL_DIALECT: &str = "sqlDialect";
pub const PROP_CHARSET: &str = "charSet";
pub const PROP_DEFAULT_ISOLATION: &str = "defaultIsolation";
pub const PROP_CONNECT_TIMEOUT: &str = "connectTimeout";
pub const PROP_USER: &str = "user";
pub const PROP_PASSWORD: &str = "password";

pub const DEFAULT_ISOLATION: &str = "TRANSACTION_READ_COMMITTED";

/// Ordered key/value list of driver options.
///
/// Iteration order is insertion order; replacing an existing key keeps its
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionProperties {
    entries: Vec<(String, String)>,
}

impl ConnectionProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed base options every connection starts from.
    pub fn base() -> Self {
        [
            (PROP_SQL_DIALECT, "3"),
            (PROP_CHARSET, "UTF-8"),
            (PROP_DEFAULT_ISOLATION, DEFAULT_ISOLATION),
            (PROP_CONNECT_TIMEOUT, "30"),
        ]
        .into_iter()
        .collect()
    }

    /// Insert or replace a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `overrides` on top of `self`; override values win key-for-key.
    pub fn merged(&self, overrides: &ConnectionProperties) -> Self {
        let mut merged = self.clone();
        for (k, v) in overrides.iter() {
            merged.set(k, v);
        }
        merged
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConnectionProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (k, v) in iter {
            props.set(k, v);
        }
        props
    }
}

impl Serialize for ConnectionProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Isolation value carrying an explicit lock timeout (seconds).
pub fn isolation_with_lock_timeout(lock_timeout: u32) -> String {
    format!("{DEFAULT_ISOLATION},read_committed,rec_version,write,wait,lock_timeout={lock_timeout}")
}

/// Effective options for a new connection: base options (with the lock-timeout
/// rewrite applied), then settings-level overrides, then per-call overrides.
pub fn effective_properties(
    settings: &ConnectionSettings,
    overrides: &ConnectionProperties,
) -> ConnectionProperties {
    let mut props = ConnectionProperties::base();
    if let Some(lock_timeout) = settings.lock_timeout {
        props.set(PROP_DEFAULT_ISOLATION, isolation_with_lock_timeout(lock_timeout));
    }
    props.merged(&settings.property_overrides()).merged(overrides)
}

/// Property list handed to the driver: credentials first, then options.
pub fn driver_properties(
    settings: &ConnectionSettings,
    options: &ConnectionProperties,
) -> ConnectionProperties {
    ConnectionProperties::new()
        .with(PROP_USER, settings.user.as_str())
        .with(PROP_PASSWORD, settings.password.as_str())
        .merged(options)
}

/// Build the driver connection string.
///
/// An explicit connection string in the settings is returned verbatim.
/// Otherwise the result is
/// `jdbc:firebirdsql:[local:|native:|embedded:]//host:port/database[?k=v&...]`.
pub fn build_connection_string(
    settings: &ConnectionSettings,
    properties: &ConnectionProperties,
) -> String {
    if let Some(explicit) = settings
        .connection_string
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        return explicit.to_string();
    }

    let mut url = String::from(CONNECTION_STRING_PREFIX);
    if let Some(segment) = settings.connection_type.segment() {
        url.push_str(segment);
        url.push(':');
    }
    let database = settings
        .database
        .strip_prefix('/')
        .unwrap_or(&settings.database);
    let _ = write!(url, "//{}:{}/{}", settings.host, settings.port, database);

    for (i, (k, v)) in properties.iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        let _ = write!(url, "{k}={v}");
    }
    url
}
