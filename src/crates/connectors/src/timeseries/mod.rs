//! Time-series store adapter.

#[cfg(feature = "influxdb")]
pub mod influx;
pub mod point;

#[cfg(feature = "influxdb")]
pub use influx::{InfluxClient, InfluxConnector};
pub use point::{series_points, FieldValue, Point, SeriesRow};

use crate::cache::{ConnectionCache, Connector};
use crate::config::ConnectionConfig;
use crate::error::Result;
use tracing::debug;

/// One returned row, column name to value.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Operations a time-series connection supports.
pub trait TimeSeriesSession {
    /// Run a query and flatten every returned series into records.
    fn query(&mut self, query: &str) -> Result<Vec<Record>>;

    /// Write points in one request.
    fn write_points(&mut self, points: &[Point]) -> Result<()>;

    fn create_database(&mut self, name: &str) -> Result<()>;
}

/// Cached time-series connection. Matching configurations are reused
/// without a liveness probe.
pub struct TimeSeriesStore<C: Connector> {
    cache: ConnectionCache<C>,
}

impl<C> TimeSeriesStore<C>
where
    C: Connector,
    C::Connection: TimeSeriesSession,
{
    pub fn new(connector: C) -> Self {
        Self {
            cache: ConnectionCache::new(connector),
        }
    }

    pub fn query(&self, config: &ConnectionConfig, query: &str) -> Result<Vec<Record>> {
        let mut conn = self.cache.ensure(config)?;
        conn.query(query)
    }

    /// Write series rows into `measurement`. See [`SeriesRow::to_point`].
    pub fn write(&self, config: &ConnectionConfig, measurement: &str, rows: &[SeriesRow]) -> Result<()> {
        self.write_points(config, &series_points(measurement, rows))
    }

    pub fn write_points(&self, config: &ConnectionConfig, points: &[Point]) -> Result<()> {
        let mut conn = self.cache.ensure(config)?;
        if points.is_empty() {
            debug!("No points to write");
            return Ok(());
        }
        conn.write_points(points)
    }

    pub fn create_database(&self, config: &ConnectionConfig, name: &str) -> Result<()> {
        let mut conn = self.cache.ensure(config)?;
        conn.create_database(name)
    }

    pub fn cache(&self) -> &ConnectionCache<C> {
        &self.cache
    }
}

#[cfg(feature = "influxdb")]
impl TimeSeriesStore<InfluxConnector> {
    /// Store backed by the InfluxDB 1.x HTTP API.
    pub fn influxdb() -> Self {
        Self::new(InfluxConnector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResourceKind;
    use std::sync::Arc;

    type Written = Arc<parking_lot::Mutex<Vec<Point>>>;

    struct Recorder(Written);

    impl TimeSeriesSession for Recorder {
        fn query(&mut self, _query: &str) -> Result<Vec<Record>> {
            Ok(Vec::new())
        }

        fn write_points(&mut self, points: &[Point]) -> Result<()> {
            self.0.lock().extend_from_slice(points);
            Ok(())
        }

        fn create_database(&mut self, _name: &str) -> Result<()> {
            Ok(())
        }
    }

    struct RecorderConnector(Written);

    impl Connector for RecorderConnector {
        type Connection = Recorder;

        fn kind(&self) -> ResourceKind {
            ResourceKind::TimeSeries
        }

        fn connect(&self, _config: &ConnectionConfig) -> Result<Recorder> {
            Ok(Recorder(Arc::clone(&self.0)))
        }
    }

    #[test]
    fn test_write_builds_numbered_fields() {
        let written = Written::default();
        let store = TimeSeriesStore::new(RecorderConnector(Arc::clone(&written)));
        let config = ConnectionConfig::new().with("host", "h").with("database", "db");

        store
            .write(
                &config,
                "tbl",
                &[SeriesRow::new("2024-03-09 08:00:00", "tagA", vec![1.2345, 6.789])],
            )
            .unwrap();

        let points = written.lock();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].measurement, "tbl");
        assert_eq!(points[0].fields.get("v1"), Some(&FieldValue::Float(1.234)));
        assert_eq!(points[0].fields.get("v2"), Some(&FieldValue::Float(6.789)));
        assert!(points[0].time.as_deref().unwrap().ends_with("+08:00"));
    }

    #[test]
    fn test_empty_write_still_connects() {
        let store = TimeSeriesStore::new(RecorderConnector(Written::default()));
        let config = ConnectionConfig::new().with("host", "h");
        store.write_points(&config, &[]).unwrap();
        assert!(store.cache().is_connected());
    }
}
