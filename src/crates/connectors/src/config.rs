//! Connection configuration.
//!
//! A [`ConnectionConfig`] is a flat, ordered map of string parameters.
//! Values are stored in rendered form so that two configurations compare
//! and fingerprint by content, regardless of how they were built.
//!
//! # Example
//!
//! ```rust
//! use connectors::ConnectionConfig;
//!
//! let a = ConnectionConfig::new().with("host", "10.0.0.5").with("port", 3306);
//! let b = ConnectionConfig::new().with("port", "3306").with("host", "10.0.0.5");
//! assert_eq!(a, b);
//! assert_eq!(a.fingerprint(), b.fingerprint());
//! ```

use crate::error::{ConnectorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tooling::config::{parse_bool, ConfigSource};
use tooling::logging::is_secret_key;
use tooling::Fingerprint;

/// Named parameters required to open one connection.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionConfig {
    entries: BTreeMap<String, String>,
}

impl ConnectionConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.entries.insert(key.into(), value.to_string());
        self
    }

    /// Load one section of a configuration source.
    pub fn from_source(source: &dyn ConfigSource, section: &str) -> Result<Self> {
        Ok(Self {
            entries: source.section(section)?,
        })
    }

    /// Fingerprint of the full parameter set.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self.entries.iter())
    }

    /// Raw value of a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value of a parameter that must be present and non-blank.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConnectorError::Config(format!("missing required key '{}'", key)))
    }

    /// Value of a parameter, or `default` when absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Parse a parameter; `None` when absent or blank.
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key).map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => raw.parse::<T>().map(Some).map_err(|e| {
                ConnectorError::Config(format!("invalid value '{}' for key '{}': {}", raw, key, e))
            }),
            None => Ok(None),
        }
    }

    /// Parse a parameter, or `default` when absent.
    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        Ok(self.parse(key)?.unwrap_or(default))
    }

    /// Boolean parameter (`true/false`, `1/0`, `yes/no`, `on/off`).
    pub fn flag_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key).map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => parse_bool(raw).ok_or_else(|| {
                ConnectorError::Config(format!("invalid boolean '{}' for key '{}'", raw, key))
            }),
            None => Ok(default),
        }
    }

    /// Timeout expressed in whole seconds.
    pub fn timeout_secs(&self, key: &str) -> Result<Option<Duration>> {
        Ok(self.parse::<u64>(key)?.map(Duration::from_secs))
    }

    /// Timeout expressed in milliseconds.
    pub fn timeout_millis(&self, key: &str) -> Result<Option<Duration>> {
        Ok(self.parse::<u64>(key)?.map(Duration::from_millis))
    }

    /// Iterate parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.entries {
            if is_secret_key(key) {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for ConnectionConfig
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.to_string()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, String>> for ConnectionConfig {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }
}
