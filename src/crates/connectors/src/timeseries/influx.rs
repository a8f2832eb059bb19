//! InfluxDB 1.x backend over the HTTP API.

use super::{Point, Record, TimeSeriesSession};
use crate::cache::Connector;
use crate::config::ConnectionConfig;
use crate::error::{ConnectorError, ResourceKind, Result};
use crate::http::{ClientConfig, HttpClient};
use reqwest::blocking::RequestBuilder;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value as Json;
use std::collections::BTreeMap;
use tracing::debug;

const DEFAULT_PORT: u16 = 8086;
const KIND: ResourceKind = ResourceKind::TimeSeries;

/// Opens InfluxDB clients.
///
/// Keys: `host`, `port` (8086), `username`, `password`, `database`,
/// `ssl` (false), `timeout` in seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfluxConnector;

impl Connector for InfluxConnector {
    type Connection = InfluxClient;

    fn kind(&self) -> ResourceKind {
        KIND
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<InfluxClient> {
        let client = InfluxClient::from_config(config)?;
        client
            .ping()
            .map_err(|e| ConnectorError::connection(KIND, e))?;
        Ok(client)
    }
}

/// HTTP client bound to one server and database.
pub struct InfluxClient {
    http: HttpClient,
    credentials: Option<(String, String)>,
    database: Option<String>,
}

impl InfluxClient {
    /// Build a client without contacting the server.
    pub fn from_config(config: &ConnectionConfig) -> Result<Self> {
        let scheme = if config.flag_or("ssl", false)? { "https" } else { "http" };
        let base = format!(
            "{}://{}:{}",
            scheme,
            config.require("host")?,
            config.parse_or("port", DEFAULT_PORT)?
        );
        let http = HttpClient::new(
            KIND,
            ClientConfig::new(base).with_timeout(config.timeout_secs("timeout")?),
        )?;
        let credentials = config
            .get("username")
            .filter(|u| !u.is_empty())
            .map(|u| (u.to_string(), config.get_or("password", "").to_string()));
        Ok(Self {
            http,
            credentials,
            database: config.get("database").filter(|d| !d.is_empty()).map(str::to_string),
        })
    }

    /// Check the server answers `/ping`.
    pub fn ping(&self) -> Result<()> {
        self.http.send(self.http.request(Method::GET, "/ping"))?;
        Ok(())
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, path);
        match &self.credentials {
            Some((user, password)) => request.basic_auth(user, Some(password)),
            None => request,
        }
    }

    fn run_query(&self, method: Method, query: &str) -> Result<QueryResponse> {
        let mut params = vec![("q", query)];
        if let Some(db) = &self.database {
            params.push(("db", db.as_str()));
        }
        let response = self.http.send(self.request(method, "/query").query(&params))?;
        let body: QueryResponse = response
            .json()
            .map_err(|e| ConnectorError::operation(KIND, format!("invalid query response: {}", e)))?;
        body.check()?;
        Ok(body)
    }
}

impl TimeSeriesSession for InfluxClient {
    fn query(&mut self, query: &str) -> Result<Vec<Record>> {
        let records = self.run_query(Method::GET, query)?.into_records();
        debug!(records = records.len(), "Influx query finished");
        Ok(records)
    }

    fn write_points(&mut self, points: &[Point]) -> Result<()> {
        let db = self
            .database
            .as_deref()
            .ok_or_else(|| ConnectorError::Config("missing required key 'database'".into()))?;
        let body = points
            .iter()
            .map(Point::to_line)
            .collect::<Result<Vec<_>>>()?
            .join("\n");

        let request = self
            .request(Method::POST, "/write")
            .query(&[("db", db), ("precision", "ns")])
            .body(body);
        self.http.send(request)?;
        debug!(points = points.len(), database = db, "Influx write finished");
        Ok(())
    }

    fn create_database(&mut self, name: &str) -> Result<()> {
        let statement = format!("CREATE DATABASE \"{}\"", name.replace('"', "\\\""));
        self.run_query(Method::POST, &statement)?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Vec<Series>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Series {
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    values: Vec<Vec<Json>>,
}

impl QueryResponse {
    fn check(&self) -> Result<()> {
        let error = self
            .error
            .as_deref()
            .or_else(|| self.results.iter().find_map(|r| r.error.as_deref()));
        match error {
            Some(message) => Err(ConnectorError::operation(KIND, message)),
            None => Ok(()),
        }
    }

    /// Every row of every series, with series tags merged in.
    fn into_records(self) -> Vec<Record> {
        let mut records = Vec::new();
        for series in self.results.into_iter().flat_map(|r| r.series) {
            for row in series.values {
                let mut record: Record = series.columns.iter().cloned().zip(row).collect();
                for (key, value) in &series.tags {
                    record.insert(key.clone(), Json::String(value.clone()));
                }
                records.push(record);
            }
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_from_response() {
        let body: QueryResponse = serde_json::from_value(json!({
            "results": [{
                "statement_id": 0,
                "series": [{
                    "name": "tbl",
                    "tags": {"tid": "tagA"},
                    "columns": ["time", "v1"],
                    "values": [["2024-03-09T00:00:00Z", 1.234], ["2024-03-09T00:01:00Z", null]]
                }]
            }]
        }))
        .unwrap();
        assert!(body.check().is_ok());

        let records = body.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["v1"], json!(1.234));
        assert_eq!(records[0]["tid"], json!("tagA"));
        assert_eq!(records[1]["v1"], Json::Null);
    }

    #[test]
    fn test_statement_error_surfaces() {
        let body: QueryResponse = serde_json::from_value(json!({
            "results": [{"statement_id": 0, "error": "database not found: nope"}]
        }))
        .unwrap();
        let err = body.check().unwrap_err();
        assert!(err.to_string().contains("database not found"));
    }

    #[test]
    fn test_from_config() {
        let config = ConnectionConfig::new()
            .with("host", "10.0.0.5")
            .with("ssl", true)
            .with("username", "admin")
            .with("password", "123456")
            .with("database", "db_test");
        let client = InfluxClient::from_config(&config).unwrap();
        assert_eq!(client.http.base_url(), "https://10.0.0.5:8086");
        assert_eq!(client.database(), Some("db_test"));

        assert!(InfluxClient::from_config(&ConnectionConfig::new()).is_err());
    }

    #[test]
    fn test_write_without_database_is_config_error() {
        let mut client =
            InfluxClient::from_config(&ConnectionConfig::new().with("host", "127.0.0.1")).unwrap();
        let points = [Point::new("m").field("v", 1.0)];
        assert!(matches!(
            client.write_points(&points),
            Err(ConnectorError::Config(_))
        ));
    }
}
