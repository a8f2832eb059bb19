//! Points and their line-protocol rendering.

use crate::error::{ConnectorError, ResourceKind, Result};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tooling::round_to;

/// Offset appended to series row timestamps.
pub const SERIES_OFFSET: &str = "+08:00";

/// Tag key carrying a series row's tag.
pub const SERIES_TAG: &str = "tid";

/// Decimal places kept for series row values.
pub const SERIES_PRECISION: usize = 3;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// One time-series point.
///
/// Serializes to the same shape as the JSON points accepted by the usual
/// InfluxDB clients (`measurement`, `time`, `tags`, `fields`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub measurement: String,
    /// RFC 3339 timestamp; the server assigns one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Point {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            time: None,
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Render as one line of InfluxDB line protocol, nanosecond precision.
    pub fn to_line(&self) -> Result<String> {
        if self.measurement.is_empty() {
            return Err(invalid("point has an empty measurement"));
        }
        if self.fields.is_empty() {
            return Err(invalid(format!("point '{}' has no fields", self.measurement)));
        }

        let mut line = escape(&self.measurement, &[',', ' ']);
        for (key, value) in &self.tags {
            let _ = write!(line, ",{}={}", escape(key, TAG_SPECIAL), escape(value, TAG_SPECIAL));
        }

        let mut sep = ' ';
        for (key, value) in &self.fields {
            line.push(sep);
            line.push_str(&escape(key, TAG_SPECIAL));
            line.push('=');
            match value {
                FieldValue::Bool(v) => line.push_str(if *v { "true" } else { "false" }),
                FieldValue::Integer(v) => {
                    let _ = write!(line, "{}i", v);
                }
                FieldValue::Float(v) => {
                    if !v.is_finite() {
                        return Err(invalid(format!("field '{}' is not finite", key)));
                    }
                    let _ = write!(line, "{}", v);
                }
                FieldValue::Text(v) => {
                    let _ = write!(line, "\"{}\"", escape(v, &['"', '\\']));
                }
            }
            sep = ',';
        }

        if let Some(time) = &self.time {
            let _ = write!(line, " {}", timestamp_nanos(time)?);
        }
        Ok(line)
    }
}

const TAG_SPECIAL: &[char] = &[',', '=', ' '];

fn escape(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Nanoseconds since the epoch. Times without an offset are read as UTC.
fn timestamp_nanos(time: &str) -> Result<i64> {
    let utc = match DateTime::parse_from_rfc3339(time) {
        Ok(dt) => dt.naive_utc(),
        Err(_) => NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| invalid(format!("invalid point time '{}': {}", time, e)))?,
    };
    utc.and_utc()
        .timestamp_nanos_opt()
        .ok_or_else(|| invalid(format!("point time '{}' is out of range", time)))
}

fn invalid(message: impl std::fmt::Display) -> ConnectorError {
    ConnectorError::operation(ResourceKind::TimeSeries, message)
}

/// A compact series row: timestamp, tag, then numbered values.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    /// Local timestamp, `YYYY-MM-DD HH:MM:SS[.ffffff]`.
    pub time: String,
    pub tag: String,
    pub values: Vec<f64>,
}

impl SeriesRow {
    pub fn new(time: impl Into<String>, tag: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            time: time.into(),
            tag: tag.into(),
            values,
        }
    }

    /// Row stamped with a local date-time.
    pub fn at(time: NaiveDateTime, tag: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(time.format("%Y-%m-%d %H:%M:%S%.f").to_string(), tag, values)
    }

    /// Build the point for `measurement`.
    ///
    /// Values become fields `v1..vn` rounded to three decimals, the tag is
    /// stored under `tid`, and the time gets a `T` separator and a fixed
    /// `+08:00` offset.
    pub fn to_point(&self, measurement: &str) -> Point {
        let fields = self
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("v{}", i + 1), FieldValue::Float(round_to(*v, SERIES_PRECISION))))
            .collect();
        Point {
            measurement: measurement.to_string(),
            time: Some(format!("{}{}", self.time.replace(' ', "T"), SERIES_OFFSET)),
            tags: BTreeMap::from([(SERIES_TAG.to_string(), self.tag.clone())]),
            fields,
        }
    }
}

/// Points for a batch of series rows.
pub fn series_points(measurement: &str, rows: &[SeriesRow]) -> Vec<Point> {
    rows.iter().map(|row| row.to_point(measurement)).collect()
}
