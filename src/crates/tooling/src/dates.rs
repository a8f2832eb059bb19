//! Date helpers
//!
//! Thin wrappers over chrono's naive date-times using strftime-style format
//! strings. Everything here is zone-less; the only zone-aware rule is that a
//! string parsed with [`INFLUX`] (a UTC timestamp) is shifted to UTC+8.

use crate::{round_to, Result, ToolingError};
use chrono::format::{Item, StrftimeItems};
use chrono::{Duration, Local, Months, NaiveDate, NaiveDateTime};

/// `2024-03-01 12:30:45.123456`
pub const STD_MICROS: &str = "%Y-%m-%d %H:%M:%S%.6f";
/// `2024-03-01 12:30:45`
pub const STD_SECONDS: &str = "%Y-%m-%d %H:%M:%S";
/// `2024-03-01`
pub const STD_DAY: &str = "%Y-%m-%d";
/// `20240301`
pub const TRIM_DAY: &str = "%Y%m%d";
/// `202403`
pub const TRIM_MONTH: &str = "%Y%m";
/// `2024年03月01日`
pub const CHN_DAY: &str = "%Y年%m月%d日";
/// `2024年03月`
pub const CHN_MONTH: &str = "%Y年%m月";
/// `2024_0301_1230`
pub const CUSTOM_MINUTE: &str = "%Y_%m%d_%H%M";
/// `2024-03-01T04:30:45Z`, as returned by InfluxDB
pub const INFLUX: &str = "%Y-%m-%dT%H:%M:%SZ";

const INFLUX_SHIFT_HOURS: i64 = 8;

/// Unit for [`diff`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateUnit {
    #[default]
    Second,
    Minute,
    Hour,
    Day,
    Year,
}

impl DateUnit {
    fn seconds(self) -> i64 {
        match self {
            DateUnit::Second => 1,
            DateUnit::Minute => 60,
            DateUnit::Hour => 60 * 60,
            DateUnit::Day => 60 * 60 * 24,
            DateUnit::Year => 60 * 60 * 24 * 365,
        }
    }
}

/// Parse a date string
///
/// Formats without a time part yield midnight; formats without a day
/// yield the first of the month. Strings in the [`INFLUX`] format are
/// shifted by +8 hours.
///
/// ```rust
/// use tooling::dates::{parse_datetime, INFLUX, TRIM_MONTH};
///
/// let dt = parse_datetime("2024-03-01T04:00:00Z", INFLUX).unwrap();
/// assert_eq!(dt.to_string(), "2024-03-01 12:00:00");
///
/// let month = parse_datetime("202403", TRIM_MONTH).unwrap();
/// assert_eq!(month.to_string(), "2024-03-01 00:00:00");
/// ```
pub fn parse_datetime(input: &str, format: &str) -> Result<NaiveDateTime> {
    let parsed = NaiveDateTime::parse_from_str(input, format)
        .or_else(|_| NaiveDate::parse_from_str(input, format).map(midnight))
        .or_else(|e| {
            if format.contains("%d") {
                return Err(e);
            }
            NaiveDate::parse_from_str(&format!("{}|01", input), &format!("{}|%d", format))
                .map(midnight)
        })
        .map_err(|source| ToolingError::DateParse {
            input: input.to_string(),
            format: format.to_string(),
            source,
        })?;

    if format == INFLUX {
        return Ok(parsed + Duration::hours(INFLUX_SHIFT_HOURS));
    }
    Ok(parsed)
}

/// Render a date-time with a strftime format
///
/// Unlike chrono's `format`, an invalid format string is an error rather
/// than a panic.
pub fn format_datetime(dt: &NaiveDateTime, format: &str) -> Result<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(ToolingError::Config(format!("Invalid date format: {}", format)));
    }
    Ok(dt.format_with_items(items.into_iter()).to_string())
}

/// Re-render a date string from one format into another
///
/// ```rust
/// use tooling::dates::{convert_format, CHN_DAY, STD_SECONDS};
///
/// let s = convert_format("2024-03-01 08:00:00", STD_SECONDS, CHN_DAY).unwrap();
/// assert_eq!(s, "2024年03月01日");
/// ```
pub fn convert_format(input: &str, src_format: &str, dst_format: &str) -> Result<String> {
    format_datetime(&parse_datetime(input, src_format)?, dst_format)
}

/// Current local time without zone
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Shift a date-time by months, days and seconds
///
/// Month shifts clamp to the last valid day (`Jan 31 + 1 month = Feb 29`
/// in a leap year). Negative values shift backwards.
pub fn shift(dt: NaiveDateTime, months: i32, days: i64, seconds: i64) -> Result<NaiveDateTime> {
    let magnitude = Months::new(months.unsigned_abs());
    let shifted = if months >= 0 {
        dt.checked_add_months(magnitude)
    } else {
        dt.checked_sub_months(magnitude)
    };

    shifted
        .and_then(|d| d.checked_add_signed(Duration::days(days)))
        .and_then(|d| d.checked_add_signed(Duration::seconds(seconds)))
        .ok_or_else(|| {
            ToolingError::DateRange(format!(
                "{} shifted by {} months, {} days, {} seconds",
                dt, months, days, seconds
            ))
        })
}

/// Difference `second - first` between two date strings
///
/// Positive when `second` is later. Seconds are whole; every other unit
/// is rounded to one decimal.
///
/// ```rust
/// use tooling::dates::{diff, DateUnit, STD_SECONDS};
///
/// let hours = diff("2024-03-01 00:00:00", "2024-03-01 01:30:00", STD_SECONDS, DateUnit::Hour).unwrap();
/// assert_eq!(hours, 1.5);
/// ```
pub fn diff(first: &str, second: &str, format: &str, unit: DateUnit) -> Result<f64> {
    let a = parse_datetime(first, format)?;
    let b = parse_datetime(second, format)?;
    let secs = (b - a).num_seconds();

    match unit {
        DateUnit::Second => Ok(secs as f64),
        other => Ok(round_to(secs as f64 / other.seconds() as f64, 1)),
    }
}

/// Midnight at the start of the day the string falls on
pub fn day_start(input: &str, format: &str) -> Result<NaiveDateTime> {
    Ok(midnight(parse_datetime(input, format)?.date()))
}

/// Midnight at the start of the following day
pub fn day_end(input: &str, format: &str) -> Result<NaiveDateTime> {
    let start = day_start(input, format)?;
    start
        .checked_add_signed(Duration::days(1))
        .ok_or_else(|| ToolingError::DateRange(format!("day after {}", start)))
}

/// Whether two date-times are more than `shift_secs` seconds apart
pub fn over_shift(a: NaiveDateTime, b: NaiveDateTime, shift_secs: i64) -> bool {
    (a - b).num_seconds().abs() > shift_secs
}

/// Minute-resolution stamp such as `2024_0301_1230`
pub fn minute_stamp(dt: &NaiveDateTime) -> String {
    dt.format(CUSTOM_MINUTE).to_string()
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        parse_datetime(s, STD_SECONDS).unwrap()
    }

    #[test]
    fn test_parse_date_only_formats() {
        assert_eq!(parse_datetime("20240301", TRIM_DAY).unwrap(), at("2024-03-01 00:00:00"));
        assert_eq!(parse_datetime("2024年03月", CHN_MONTH).unwrap(), at("2024-03-01 00:00:00"));
    }

    #[test]
    fn test_parse_micros() {
        let dt = parse_datetime("2024-03-01 08:00:00.250000", STD_MICROS).unwrap();
        assert_eq!(format_datetime(&dt, STD_MICROS).unwrap(), "2024-03-01 08:00:00.250000");
    }

    #[test]
    fn test_parse_mismatch_is_error() {
        let err = parse_datetime("yesterday", STD_SECONDS).unwrap_err();
        assert!(matches!(err, ToolingError::DateParse { .. }));
    }

    #[test]
    fn test_influx_shift() {
        let dt = parse_datetime("2024-12-31T20:00:00Z", INFLUX).unwrap();
        assert_eq!(dt, at("2025-01-01 04:00:00"));
    }

    #[test]
    fn test_format_invalid_pattern() {
        assert!(format_datetime(&at("2024-03-01 00:00:00"), "%Q").is_err());
    }

    #[test]
    fn test_shift_months_clamps() {
        let dt = at("2024-01-31 10:00:00");
        assert_eq!(shift(dt, 1, 0, 0).unwrap(), at("2024-02-29 10:00:00"));
        assert_eq!(shift(dt, -2, 0, 0).unwrap(), at("2023-11-30 10:00:00"));
        assert_eq!(shift(dt, 0, 1, -3600).unwrap(), at("2024-02-01 09:00:00"));
    }

    #[test]
    fn test_diff_units() {
        let a = "2024-03-01 00:00:00";
        let b = "2024-03-02 12:00:00";
        assert_eq!(diff(a, b, STD_SECONDS, DateUnit::Second).unwrap(), 129_600.0);
        assert_eq!(diff(a, b, STD_SECONDS, DateUnit::Minute).unwrap(), 2160.0);
        assert_eq!(diff(a, b, STD_SECONDS, DateUnit::Day).unwrap(), 1.5);
        assert_eq!(diff(b, a, STD_SECONDS, DateUnit::Hour).unwrap(), -36.0);
        assert_eq!(diff(a, b, STD_SECONDS, DateUnit::Year).unwrap(), 0.0);
    }

    #[test]
    fn test_day_bounds() {
        assert_eq!(day_start("2024-02-29 17:45:00", STD_SECONDS).unwrap(), at("2024-02-29 00:00:00"));
        assert_eq!(day_end("2024-02-29 17:45:00", STD_SECONDS).unwrap(), at("2024-03-01 00:00:00"));
    }

    #[test]
    fn test_over_shift() {
        let a = at("2024-03-01 00:00:00");
        assert!(!over_shift(a, at("2024-03-01 00:01:00"), 60));
        assert!(over_shift(at("2024-03-01 00:01:01"), a, 60));
    }

    #[test]
    fn test_minute_stamp() {
        assert_eq!(minute_stamp(&at("2024-03-01 12:30:59")), "2024_0301_1230");
    }
}
