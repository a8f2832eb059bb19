//! Helper toolkit for wlfkit
//!
//! This crate carries the small, dependency-light helpers that the
//! connector crate and applications share.
//!
//! # Modules
//!
//! - `config` - `ConfigBuilder`, environment variable helpers, INI and env config sources
//! - `dates` - Date format constants and chrono-based date arithmetic
//! - `error` - Error chain formatting
//! - `fingerprint` - Name-based UUIDs over sorted key/value pairs
//! - `fs` - Directory and file helpers with human-readable sizes
//! - `logging` - Subscriber setup, banner records and timing helpers
//! - `partition` - Value range and time bucket partitioning

pub mod config;
pub mod dates;
pub mod error;
pub mod fingerprint;
pub mod fs;
pub mod logging;
pub mod partition;

use thiserror::Error;

pub use fingerprint::{name_uuid, Fingerprint};

/// Errors that can occur in the tooling crate
#[derive(Debug, Error)]
pub enum ToolingError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// INI file could not be loaded
    #[error("INI error: {0}")]
    Ini(#[from] ini::Error),

    /// Date string did not match the expected format
    #[error("Date parse error for '{input}' with format '{format}': {source}")]
    DateParse {
        input: String,
        format: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Date arithmetic left the representable range
    #[error("Date out of range: {0}")]
    DateRange(String),

    /// Logging subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}

/// Result type for tooling operations
pub type Result<T> = std::result::Result<T, ToolingError>;

/// Round `value` to `places` decimal digits.
///
/// Rounding is done on the exact binary value, so `1.2345` (stored as
/// `1.23449999...`) becomes `1.234`, not `1.235`.
///
/// ```rust
/// use tooling::round_to;
///
/// assert_eq!(round_to(1.2345, 3), 1.234);
/// assert_eq!(round_to(6.789, 3), 6.789);
/// ```
pub fn round_to(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_uses_exact_binary_value() {
        assert_eq!(round_to(1.2345, 3), 1.234);
        assert_eq!(round_to(0.0005, 3), 0.001);
        assert_eq!(round_to(-3.14159, 2), -3.14);
    }

    #[test]
    fn test_round_to_keeps_non_finite() {
        assert!(round_to(f64::NAN, 3).is_nan());
        assert_eq!(round_to(f64::INFINITY, 3), f64::INFINITY);
    }

    #[test]
    fn test_version() {
        let v = version();
        assert!(!v.is_empty());
    }
}
