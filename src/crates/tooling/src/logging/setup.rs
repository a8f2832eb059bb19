//! Subscriber installation
//!
//! One daily-rotated log file, optionally mirrored to a coloured console.

use crate::config::{get_env, get_env_bool, get_env_parse, ConfigBuilder};
use crate::fs::create_dir_if_missing;
use crate::{Result, ToolingError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging setup
///
/// Unset fields fall back to the defaults: `logs/app.log`, no console,
/// level `debug`, three rotated files kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log file path; rotated files get a `.YYYY-MM-DD` suffix
    pub file: Option<PathBuf>,
    /// Mirror records to stderr with ANSI colours
    pub console: Option<bool>,
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set
    pub level: Option<String>,
    /// Number of rotated files to keep
    pub max_files: Option<usize>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("logs/app.log")),
            console: Some(false),
            level: Some("debug".to_string()),
            max_files: Some(3),
        }
    }
}

impl LogConfig {
    /// Configuration writing to `file`, all else default
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::default()
        }
    }

    /// Enable or disable the console mirror
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = Some(console);
        self
    }

    /// Set the filter directive
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Set how many rotated files are kept
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = Some(max_files);
        self
    }

    fn split_file(&self) -> Result<(PathBuf, String)> {
        let file = self
            .file
            .as_deref()
            .ok_or_else(|| ToolingError::Config("Log file path is not set".into()))?;
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ToolingError::Config(format!("Invalid log file path: {}", file.display())))?;
        let dir = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Ok((dir.to_path_buf(), name.to_string()))
    }
}

impl ConfigBuilder for LogConfig {
    fn validate(&self) -> Result<()> {
        self.split_file()?;
        if self.max_files == Some(0) {
            return Err(ToolingError::Config("max_files must be at least 1".into()));
        }
        if let Some(level) = &self.level {
            EnvFilter::try_new(level)
                .map_err(|e| ToolingError::Config(format!("Invalid log level '{}': {}", level, e)))?;
        }
        Ok(())
    }

    fn from_env(prefix: &str) -> Result<Self> {
        Ok(Self {
            file: get_env(&format!("{}LOG_FILE", prefix))?.map(PathBuf::from),
            console: get_env_bool(&format!("{}LOG_CONSOLE", prefix))?,
            level: get_env(&format!("{}LOG_LEVEL", prefix))?,
            max_files: get_env_parse(&format!("{}LOG_MAX_FILES", prefix))?,
        })
    }

    fn merge(&mut self, other: Self) -> &mut Self {
        if self.file.is_none() {
            self.file = other.file;
        }
        if self.console.is_none() {
            self.console = other.console;
        }
        if self.level.is_none() {
            self.level = other.level;
        }
        if self.max_files.is_none() {
            self.max_files = other.max_files;
        }
        self
    }
}

/// Keeps the background file writer alive
///
/// Dropping the handle flushes buffered records.
pub struct LogHandle {
    directory: PathBuf,
    _guard: WorkerGuard,
}

impl LogHandle {
    /// Directory the rotated files are written to
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Install the global subscriber
///
/// Fails, rather than panicking, when a global subscriber is already set.
pub fn init(config: &LogConfig) -> Result<LogHandle> {
    config.validate()?;
    let (directory, file_name) = config.split_file()?;
    create_dir_if_missing(&directory)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_name)
        .max_log_files(config.max_files.unwrap_or(3))
        .build(&directory)
        .map_err(|e| ToolingError::Logging(e.to_string()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let level = config.level.as_deref().unwrap_or("debug");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| ToolingError::Logging(e.to_string()))?;

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true);
    let console_layer = config.console.unwrap_or(false).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| ToolingError::Logging(e.to_string()))?;

    tracing::info!(directory = %directory.display(), level, "Logging initialized");
    Ok(LogHandle {
        directory,
        _guard: guard,
    })
}
