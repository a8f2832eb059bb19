//! Configuration builder trait
//!
//! Structured settings implement this to share one path for defaults,
//! environment loading, merging and validation.

use crate::Result;

/// Trait for configuration structures that support building, validation, and merging
///
/// # Example
///
/// ```rust,ignore
/// use tooling::config::{get_env_parse, ConfigBuilder};
///
/// #[derive(Clone, Default)]
/// struct PollConfig {
///     pub interval_secs: Option<u64>,
/// }
///
/// impl ConfigBuilder for PollConfig {
///     fn from_env(prefix: &str) -> tooling::Result<Self> {
///         Ok(Self {
///             interval_secs: get_env_parse(&format!("{}INTERVAL_SECS", prefix))?,
///         })
///     }
///
///     fn merge(&mut self, other: Self) -> &mut Self {
///         if self.interval_secs.is_none() {
///             self.interval_secs = other.interval_secs;
///         }
///         self
///     }
/// }
/// ```
pub trait ConfigBuilder: Default + Clone {
    /// Validate the configuration
    ///
    /// The default implementation accepts everything.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Load configuration from environment variables named `{prefix}{FIELD}`
    ///
    /// Fields whose variable is not set stay unset so that [`merge`](Self::merge)
    /// can fill them from defaults.
    fn from_env(prefix: &str) -> Result<Self>;

    /// Fill the fields `self` left unset with the values from `other`
    ///
    /// Returns self for chaining.
    fn merge(&mut self, other: Self) -> &mut Self;

    /// Default configuration, validated
    fn build() -> Result<Self> {
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Load from the environment, fill gaps from defaults, and validate
    fn from_env_with_defaults(prefix: &str) -> Result<Self> {
        let mut config = Self::from_env(prefix)?;
        config.merge(Self::default());
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolingError;

    #[derive(Debug, Clone, PartialEq)]
    struct PoolSettings {
        size: Option<u32>,
        name: Option<String>,
    }

    impl Default for PoolSettings {
        fn default() -> Self {
            Self {
                size: Some(4),
                name: Some("default".to_string()),
            }
        }
    }

    impl ConfigBuilder for PoolSettings {
        fn validate(&self) -> Result<()> {
            if self.size == Some(0) {
                return Err(ToolingError::Config("size must be positive".into()));
            }
            Ok(())
        }

        fn from_env(_prefix: &str) -> Result<Self> {
            Ok(Self {
                size: Some(16),
                name: None,
            })
        }

        fn merge(&mut self, other: Self) -> &mut Self {
            if self.size.is_none() {
                self.size = other.size;
            }
            if self.name.is_none() {
                self.name = other.name;
            }
            self
        }
    }

    #[test]
    fn test_validate_rejects_zero() {
        let settings = PoolSettings {
            size: Some(0),
            name: None,
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_build_uses_defaults() {
        let settings = PoolSettings::build().unwrap();
        assert_eq!(settings, PoolSettings::default());
    }

    #[test]
    fn test_from_env_with_defaults_fills_gaps() {
        let settings = PoolSettings::from_env_with_defaults("POOL_").unwrap();
        assert_eq!(settings.size, Some(16));
        assert_eq!(settings.name.as_deref(), Some("default"));
    }
}
