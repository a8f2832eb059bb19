//! Configuration sources and builders
//!
//! Resource configurations are flat string maps grouped into named
//! sections. A [`ConfigSource`] hands out those sections; two sources ship
//! with the crate:
//!
//! - [`IniSource`] - an INI file, one `[section]` per resource
//! - [`EnvSource`] - environment variables named `{PREFIX}{SECTION}_{KEY}`
//!
//! Structured settings (such as the logging setup) implement
//! [`ConfigBuilder`] to get defaults, env loading and validation.
//!
//! # Example
//!
//! ```rust,ignore
//! use tooling::config::{ConfigSource, IniSource};
//!
//! let source = IniSource::open("config.ini")?;
//! let mysql = source.section("mysql")?;
//! let host = source.value("mysql", "host")?;
//! ```

mod builder;
mod env;
mod ini_file;

use crate::Result;
use std::collections::BTreeMap;

pub use builder::ConfigBuilder;
pub use env::{
    build_env_key, get_env, get_env_bool, get_env_or, get_env_parse, get_env_parse_or, parse_bool,
    EnvSource,
};
pub use ini_file::IniSource;

/// A provider of named configuration sections
pub trait ConfigSource {
    /// All key/value pairs of a section
    ///
    /// Returns a `Config` error when the section does not exist.
    fn section(&self, name: &str) -> Result<BTreeMap<String, String>>;

    /// A single value, `None` when the key is absent from the section
    fn value(&self, section: &str, key: &str) -> Result<Option<String>> {
        Ok(self.section(section)?.remove(key))
    }
}
