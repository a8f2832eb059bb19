//! Connection-caching clients for external resources.
//!
//! Each store keeps at most one live connection, keyed by a fingerprint of
//! the configuration that opened it. Passing a different configuration
//! reconnects; passing the same one reuses the connection, after a health
//! probe for the kinds that have one.
//!
//! | Store              | Backend (feature)        | Probe      |
//! |--------------------|--------------------------|------------|
//! | [`SqlStore`]       | MySQL (`mysql`)          | `SELECT 1` |
//! | [`TimeSeriesStore`]| InfluxDB 1.x (`influxdb`)| none       |
//! | [`KeyValueStore`]  | Redis (`redis`)          | none       |
//! | [`ObjectStore`]    | S3 / Minio (`s3`)        | none       |
//! | [`ShellStore`]     | SSH (`ssh`)              | none       |
//!
//! # Example
//!
//! ```rust,ignore
//! use connectors::{ConnectionConfig, SqlStore};
//!
//! let store = SqlStore::mysql();
//! let config = ConnectionConfig::new()
//!     .with("host", "10.0.0.5")
//!     .with("user", "admin")
//!     .with("password", "123456")
//!     .with("database", "db_test");
//!
//! let rows = store.get(&config, "SELECT id, name FROM users")?;
//! store.save(&config, "UPDATE users SET active = 1")?;
//! ```
//!
//! Configurations can also be loaded from an INI file or the environment
//! through [`tooling::config::ConfigSource`]:
//!
//! ```rust,ignore
//! use tooling::config::IniSource;
//!
//! let ini = IniSource::open("conf/app.ini")?;
//! let config = ConnectionConfig::from_source(&ini, "mysql")?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod kv;
pub mod object;
pub mod shell;
pub mod sql;
pub mod timeseries;

pub use cache::{ConnectionCache, ConnectionHandle, Connector};
pub use config::ConnectionConfig;
pub use error::{ConnectorError, ResourceKind, Result};
pub use kv::{KeyValueSession, KeyValueStore};
pub use object::{public_read_policy, ObjectSession, ObjectStore};
pub use shell::{CommandOutput, ExecResult, ExecStatus, ShellSession, ShellStore};
pub use sql::{SqlRow, SqlSession, SqlStore};
pub use timeseries::{FieldValue, Point, Record, SeriesRow, TimeSeriesSession, TimeSeriesStore};
