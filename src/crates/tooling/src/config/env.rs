//! Environment variable helpers and the environment-backed config source

use super::ConfigSource;
use crate::{Result, ToolingError};
use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;

/// Read an environment variable
///
/// `Ok(None)` when unset, `Err` when set to something that is not UTF-8.
pub fn get_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ToolingError::Config(format!(
            "Environment variable {} contains invalid UTF-8",
            key
        ))),
    }
}

/// Read and parse an environment variable
///
/// ```rust,ignore
/// let port: Option<u16> = get_env_parse("MYSQL_PORT")?;
/// ```
pub fn get_env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key)?
        .map(|val| {
            val.trim().parse::<T>().map_err(|e| {
                ToolingError::Config(format!("Failed to parse environment variable {}: {}", key, e))
            })
        })
        .transpose()
}

/// Read an environment variable, falling back to `default` when unset
pub fn get_env_or(key: &str, default: impl Into<String>) -> Result<String> {
    Ok(get_env(key)?.unwrap_or_else(|| default.into()))
}

/// Read and parse an environment variable, falling back to `default` when unset
///
/// A set but unparsable value is still an error.
pub fn get_env_parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_env_parse(key)?.unwrap_or(default))
}

/// Read a boolean environment variable
///
/// Accepts `true/1/yes/on` and `false/0/no/off`, case-insensitive.
pub fn get_env_bool(key: &str) -> Result<Option<bool>> {
    match get_env(key)? {
        Some(val) => parse_bool(&val)
            .map(Some)
            .ok_or_else(|| ToolingError::Config(format!("Invalid boolean value for {}: {}", key, val))),
        None => Ok(None),
    }
}

/// Parse `true/1/yes/on` or `false/0/no/off`, case-insensitive
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Build a prefixed, upper-cased environment variable name
///
/// ```rust
/// use tooling::config::build_env_key;
///
/// assert_eq!(build_env_key("APP_", "mysql_host"), "APP_MYSQL_HOST");
/// ```
pub fn build_env_key(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name.to_uppercase())
}

/// Configuration source backed by the process environment
///
/// Section `mysql` with prefix `APP_` collects every `APP_MYSQL_<KEY>`
/// variable; keys are returned lower-cased (`APP_MYSQL_HOST` → `host`).
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    prefix: String,
}

impl EnvSource {
    /// Create a source reading variables that start with `prefix`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    fn section_prefix(&self, name: &str) -> String {
        format!("{}_", build_env_key(&self.prefix, name))
    }
}

impl ConfigSource for EnvSource {
    fn section(&self, name: &str) -> Result<BTreeMap<String, String>> {
        let prefix = self.section_prefix(name);
        let values: BTreeMap<String, String> = env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_lowercase(), value))
            })
            .collect();

        if values.is_empty() {
            return Err(ToolingError::Config(format!(
                "No environment variables found for section '{}' (prefix {})",
                name, prefix
            )));
        }
        Ok(values)
    }

    fn value(&self, section: &str, key: &str) -> Result<Option<String>> {
        get_env(&format!("{}{}", self.section_prefix(section), key.to_uppercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_missing() {
        assert!(get_env("WLFKIT_TEST_MISSING_VAR_12345").unwrap().is_none());
        assert_eq!(get_env_or("WLFKIT_TEST_MISSING_VAR_12345", "fallback").unwrap(), "fallback");
    }

    #[test]
    fn test_get_env_parse() {
        env::set_var("WLFKIT_TEST_PORT", " 3306 ");
        let port: Option<u16> = get_env_parse("WLFKIT_TEST_PORT").unwrap();
        assert_eq!(port, Some(3306));
        env::remove_var("WLFKIT_TEST_PORT");
    }

    #[test]
    fn test_get_env_parse_invalid() {
        env::set_var("WLFKIT_TEST_BAD_PORT", "not_a_port");
        let result: Result<Option<u16>> = get_env_parse("WLFKIT_TEST_BAD_PORT");
        assert!(result.is_err());
        let fallback: Result<u16> = get_env_parse_or("WLFKIT_TEST_BAD_PORT", 1);
        assert!(fallback.is_err());
        env::remove_var("WLFKIT_TEST_BAD_PORT");
    }

    #[test]
    fn test_get_env_bool() {
        for (value, expected) in [("Yes", true), ("on", true), ("0", false), ("OFF", false)] {
            env::set_var("WLFKIT_TEST_BOOL", value);
            assert_eq!(get_env_bool("WLFKIT_TEST_BOOL").unwrap(), Some(expected), "value {}", value);
        }
        env::set_var("WLFKIT_TEST_BOOL", "maybe");
        assert!(get_env_bool("WLFKIT_TEST_BOOL").is_err());
        env::remove_var("WLFKIT_TEST_BOOL");
    }

    #[test]
    fn test_env_source_section() {
        env::set_var("WLFKIT_SRC_REDIS_HOST", "cache.local");
        env::set_var("WLFKIT_SRC_REDIS_PORT", "6380");
        env::set_var("WLFKIT_SRC_REDISX_HOST", "other");

        let source = EnvSource::new("WLFKIT_SRC_");
        let section = source.section("redis").unwrap();
        assert_eq!(section.len(), 2);
        assert_eq!(section["host"], "cache.local");
        assert_eq!(section["port"], "6380");
        assert_eq!(source.value("redis", "port").unwrap().as_deref(), Some("6380"));
        assert!(source.value("redis", "db").unwrap().is_none());

        for key in ["WLFKIT_SRC_REDIS_HOST", "WLFKIT_SRC_REDIS_PORT", "WLFKIT_SRC_REDISX_HOST"] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_env_source_missing_section() {
        let source = EnvSource::new("WLFKIT_NOPE_");
        assert!(source.section("minio").is_err());
    }
}
