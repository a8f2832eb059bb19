//! Logging utilities
//!
//! Subscriber setup (daily-rotated file plus optional coloured console),
//! banner-style titled records, and timing helpers on top of `tracing`.

mod setup;

pub use setup::{init, LogConfig, LogHandle};

use std::fmt::Display;
use std::panic::Location;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const BANNER_WIDTH: usize = 100;
const ALERT_BANNER_WIDTH: usize = 120;

/// Log levels for titled records and timing helpers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Emitted at `ERROR` with `critical = true`
    Critical,
}

impl LogLevel {
    fn is_alert(self) -> bool {
        matches!(self, LogLevel::Error | LogLevel::Critical)
    }
}

macro_rules! emit {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            LogLevel::Debug => debug!($($arg)+),
            LogLevel::Info => info!($($arg)+),
            LogLevel::Warn => warn!($($arg)+),
            LogLevel::Error => error!($($arg)+),
            LogLevel::Critical => error!(critical = true, $($arg)+),
        }
    };
}

/// Centre `< title >` in a banner line
///
/// Debug to warn use a 100 column `-` banner; error and critical use a
/// 120 column `#` banner. Titles wider than the banner are returned as is.
///
/// ```rust
/// use tooling::logging::{banner, LogLevel};
///
/// let line = banner("sync", LogLevel::Info);
/// assert_eq!(line.len(), 100);
/// assert!(line.starts_with("---"));
/// assert!(line.contains("< sync >"));
/// ```
pub fn banner(title: &str, level: LogLevel) -> String {
    let (width, fill) = if level.is_alert() {
        (ALERT_BANNER_WIDTH, '#')
    } else {
        (BANNER_WIDTH, '-')
    };

    let label = format!("< {} >", title);
    let len = label.chars().count();
    if len >= width {
        return label;
    }

    let left = (width - len) / 2;
    let right = width - len - left;
    format!(
        "{}{}{}",
        fill.to_string().repeat(left),
        label,
        fill.to_string().repeat(right)
    )
}

/// Write a titled record: banner, caller location, messages, blank line
///
/// The caller's file and line are recorded from `#[track_caller]`, so
/// wrappers around this function should carry the attribute too.
///
/// ```rust,ignore
/// use tooling::logging::{titled, LogLevel};
///
/// titled(LogLevel::Error, "mysql init failed", &[&err]);
/// ```
#[track_caller]
pub fn titled(level: LogLevel, title: &str, messages: &[&dyn Display]) {
    let caller = Location::caller();
    let line = banner(title, level);

    emit!(level, caller = %caller, "{}", line);
    if !messages.is_empty() {
        let body = messages
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        emit!(level, caller = %caller, "{}", body);
    }
    emit!(level, "");
}

/// Run `f`, logging start, end and elapsed time at info level
///
/// ```rust
/// use tooling::logging::timed;
///
/// let total = timed("sum", || (1..=10).sum::<u32>());
/// assert_eq!(total, 55);
/// ```
pub fn timed<F, T>(name: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    timed_with_level(name, LogLevel::Info, f)
}

/// [`timed`] with a custom log level
pub fn timed_with_level<F, T>(name: &str, level: LogLevel, f: F) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    emit!(level, "Starting: {}", name);

    let result = f();

    emit!(level, "Completed: {} in {}", name, format_elapsed(start.elapsed()));
    result
}

/// RAII guard for logging scope entry and exit
///
/// ```rust
/// use tooling::logging::LogGuard;
///
/// fn sync_buckets() {
///     let _guard = LogGuard::new("sync_buckets");
///     // exit and elapsed time are logged when the guard drops
/// }
/// ```
pub struct LogGuard {
    name: String,
    level: LogLevel,
    start: Instant,
}

impl LogGuard {
    /// Create a guard logging at debug level
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_level(name, LogLevel::Debug)
    }

    /// Create a guard with a custom level
    pub fn with_level(name: impl Into<String>, level: LogLevel) -> Self {
        let name = name.into();
        emit!(level, "Entering: {}", name);

        Self {
            name,
            level,
            start: Instant::now(),
        }
    }

    /// Elapsed time since guard creation
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        emit!(
            self.level,
            "Exiting: {} (elapsed: {})",
            self.name,
            format_elapsed(self.start.elapsed())
        );
    }
}

/// Format an elapsed duration as seconds, minutes or hours
///
/// Up to a minute is shown in seconds, up to an hour in minutes, beyond
/// that in hours; always with two decimals.
///
/// ```rust
/// use tooling::logging::format_elapsed;
/// use std::time::Duration;
///
/// assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_elapsed(Duration::from_secs(90)), "1.50m");
/// assert_eq!(format_elapsed(Duration::from_secs(5400)), "1.50h");
/// ```
pub fn format_elapsed(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs <= 60.0 {
        format!("{:.2}s", secs)
    } else if secs <= 3600.0 {
        format!("{:.2}m", secs / 60.0)
    } else {
        format!("{:.2}h", secs / 3600.0)
    }
}

/// Redact credentials from free text before it is logged
///
/// ```rust
/// use tooling::logging::sanitize_for_logging;
///
/// let line = sanitize_for_logging("connect user=admin password=hunter2");
/// assert!(line.contains("[REDACTED]"));
/// assert!(!line.contains("hunter2"));
/// ```
pub fn sanitize_for_logging(input: &str) -> String {
    let mut result = input.to_string();

    let patterns = [
        (r"(?i)(password|passwd|pwd)\s*[:=]\s*\S+", "$1: [REDACTED]"),
        (r"(?i)(secret[_-]?key|secret)\s*[:=]\s*\S+", "$1: [REDACTED]"),
        (r"(?i)(token)\s*[:=]\s*\S+", "$1: [REDACTED]"),
        (r"(?i)(redis|mysql)://([^:/@\s]*):[^@\s]+@", "$1://$2:[REDACTED]@"),
    ];

    for (pattern, replacement) in &patterns {
        if let Ok(re) = regex::Regex::new(pattern) {
            result = re.replace_all(&result, *replacement).to_string();
        }
    }

    result
}

/// Whether a configuration key names a credential
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    ["password", "passwd", "pwd", "secret", "token"]
        .iter()
        .any(|marker| key.contains(marker))
}
