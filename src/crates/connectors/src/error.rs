//! Error types for connector operations.

use std::fmt;
use thiserror::Error;

/// Result type for connector operations.
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// The kind of resource a cache connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Relational SQL store (MySQL).
    Sql,
    /// Time-series store (InfluxDB).
    TimeSeries,
    /// Key-value store (Redis).
    KeyValue,
    /// S3-compatible object store (Minio).
    ObjectStore,
    /// Remote shell session (SSH).
    Shell,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Sql => "sql",
            ResourceKind::TimeSeries => "time-series",
            ResourceKind::KeyValue => "key-value",
            ResourceKind::ObjectStore => "object-store",
            ResourceKind::Shell => "shell",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in connector operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Missing or malformed configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A connection could not be established.
    #[error("{kind} connection failed: {message}")]
    Connection { kind: ResourceKind, message: String },

    /// The underlying client call failed.
    #[error("{kind} operation failed: {message}")]
    Operation { kind: ResourceKind, message: String },

    /// Local file access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration source or helper failure.
    #[error(transparent)]
    Tooling(#[from] tooling::ToolingError),
}

impl ConnectorError {
    /// Connection failure for `kind`.
    pub fn connection(kind: ResourceKind, message: impl fmt::Display) -> Self {
        ConnectorError::Connection {
            kind,
            message: message.to_string(),
        }
    }

    /// Operation failure for `kind`.
    pub fn operation(kind: ResourceKind, message: impl fmt::Display) -> Self {
        ConnectorError::Operation {
            kind,
            message: message.to_string(),
        }
    }

    /// Whether this is a connection failure.
    pub fn is_connection(&self) -> bool {
        matches!(self, ConnectorError::Connection { .. })
    }

    /// Whether the underlying client call failed.
    pub fn is_operation(&self) -> bool {
        matches!(self, ConnectorError::Operation { .. })
    }
}

/// Flatten a client error and its sources into one message.
pub(crate) fn describe(error: &dyn std::error::Error) -> String {
    tooling::error::flatten_error_chain(error)
}
