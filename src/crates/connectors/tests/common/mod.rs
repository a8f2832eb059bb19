//! Common test utilities: an in-memory backend that speaks every session
//! trait and records what the stores asked of it.

#![allow(dead_code)]

use connectors::timeseries::Record;
use connectors::{
    CommandOutput, ConnectionConfig, Connector, ConnectorError, KeyValueSession, ObjectSession, Point,
    ResourceKind, Result, ShellSession, SqlRow, SqlSession, TimeSeriesSession,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared, inspectable state behind every fake connection.
#[derive(Default)]
pub struct FakeState {
    pub connects: AtomicUsize,
    pub probes: AtomicUsize,
    /// Number of upcoming probes that fail.
    pub failing_probes: AtomicUsize,
    pub refuse_connect: AtomicBool,
    pub buckets: Mutex<BTreeSet<String>>,
    pub policies: Mutex<Vec<(String, String)>>,
    pub points: Mutex<Vec<Point>>,
    pub strings: Mutex<BTreeMap<String, String>>,
    /// stderr text per shell command.
    pub shell_errors: Mutex<BTreeMap<String, String>>,
}

impl FakeState {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn fail_next_probe(&self) {
        self.failing_probes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Connector handing out [`FakeConnection`]s.
pub struct FakeConnector {
    pub kind: ResourceKind,
    pub state: Arc<FakeState>,
    /// Whether cached connections are probed before reuse.
    pub probed: bool,
}

impl FakeConnector {
    pub fn new(kind: ResourceKind) -> (Self, Arc<FakeState>) {
        let state = Arc::new(FakeState::default());
        let connector = Self {
            kind,
            state: Arc::clone(&state),
            probed: kind == ResourceKind::Sql,
        };
        (connector, state)
    }
}

impl Connector for FakeConnector {
    type Connection = FakeConnection;

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<FakeConnection> {
        if self.state.refuse_connect.load(Ordering::SeqCst) {
            return Err(ConnectorError::connection(self.kind, "connection refused"));
        }
        let id = self.state.connects.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(FakeConnection {
            id,
            host: config.get_or("host", "").to_string(),
            state: Arc::clone(&self.state),
        })
    }

    fn probe(&self, _connection: &mut FakeConnection) -> Result<()> {
        if !self.probed {
            return Ok(());
        }
        self.state.probes.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .state
            .failing_probes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ConnectorError::operation(self.kind, "server has gone away"));
        }
        Ok(())
    }
}

/// One fake live connection; `id` counts connects from 1.
pub struct FakeConnection {
    pub id: usize,
    pub host: String,
    state: Arc<FakeState>,
}

impl SqlSession for FakeConnection {
    fn ping(&mut self) -> Result<()> {
        Ok(())
    }

    fn query(&mut self, sql: &str) -> Result<Vec<SqlRow>> {
        match sql.trim().strip_prefix("SELECT ") {
            Some(value) => Ok(vec![vec![serde_json::Value::from(value)]]),
            None => Err(ConnectorError::operation(ResourceKind::Sql, "syntax error")),
        }
    }

    fn execute(&mut self, _sql: &str) -> Result<()> {
        Ok(())
    }
}

impl TimeSeriesSession for FakeConnection {
    fn query(&mut self, _query: &str) -> Result<Vec<Record>> {
        Ok(Vec::new())
    }

    fn write_points(&mut self, points: &[Point]) -> Result<()> {
        self.state.points.lock().extend_from_slice(points);
        Ok(())
    }

    fn create_database(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }
}

impl KeyValueSession for FakeConnection {
    fn exists(&mut self, key: &str) -> Result<bool> {
        Ok(self.state.strings.lock().contains_key(key))
    }

    fn get(&mut self, key: &str) -> Result<Option<String>> {
        Ok(self.state.strings.lock().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.state.strings.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn list_get(&mut self, _key: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn list_push(&mut self, _key: &str, values: &[String]) -> Result<usize> {
        Ok(values.len())
    }
}

impl ObjectSession for FakeConnection {
    fn bucket_exists(&mut self, bucket: &str) -> Result<bool> {
        Ok(self.state.buckets.lock().contains(bucket))
    }

    fn make_bucket(&mut self, bucket: &str) -> Result<()> {
        self.state.buckets.lock().insert(bucket.to_string());
        Ok(())
    }

    fn set_bucket_policy(&mut self, bucket: &str, policy: &str) -> Result<()> {
        self.state
            .policies
            .lock()
            .push((bucket.to_string(), policy.to_string()));
        Ok(())
    }

    fn put_object(&mut self, _bucket: &str, _name: &str, source: &Path) -> Result<()> {
        std::fs::metadata(source)?;
        Ok(())
    }

    fn get_object(&mut self, _bucket: &str, _name: &str, target: &Path) -> Result<()> {
        std::fs::write(target, b"")?;
        Ok(())
    }
}

impl ShellSession for FakeConnection {
    fn run(&mut self, command: &str) -> Result<CommandOutput> {
        let stderr = self
            .state
            .shell_errors
            .lock()
            .get(command)
            .cloned()
            .unwrap_or_default();
        Ok(CommandOutput {
            stdout: format!("{}: ok", command),
            stderr,
            exit_status: Some(0),
        })
    }
}

/// A MySQL-shaped configuration pointing at `host`.
pub fn sql_config(host: &str) -> ConnectionConfig {
    ConnectionConfig::new()
        .with("host", host)
        .with("port", 3306)
        .with("user", "admin")
        .with("password", "123456")
        .with("database", "db_test")
}
