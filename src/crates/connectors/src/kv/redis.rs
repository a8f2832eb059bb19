//! Redis backend.

use super::KeyValueSession;
use crate::cache::Connector;
use crate::config::ConnectionConfig;
use crate::error::{describe, ConnectorError, ResourceKind, Result};
use redis::{Client, Commands, Connection, RedisError};

const DEFAULT_PORT: u16 = 6379;
const KIND: ResourceKind = ResourceKind::KeyValue;

/// Opens Redis connections.
///
/// Keys: `host`, `port` (6379), optional `username` and `password`,
/// `db` (0), `timeout` in seconds for connect, read and write.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisConnector;

impl RedisConnector {
    /// Connection URL for `config`, credentials percent-encoded.
    pub fn url(config: &ConnectionConfig) -> Result<String> {
        let host = config.require("host")?;
        let port: u16 = config.parse_or("port", DEFAULT_PORT)?;
        let db: i64 = config.parse_or("db", 0)?;

        let auth = match (
            config.get("username").filter(|u| !u.is_empty()),
            config.get("password").filter(|p| !p.is_empty()),
        ) {
            (Some(user), Some(password)) => format!(
                "{}:{}@",
                urlencoding::encode(user),
                urlencoding::encode(password)
            ),
            (None, Some(password)) => format!(":{}@", urlencoding::encode(password)),
            (Some(user), None) => format!("{}@", urlencoding::encode(user)),
            (None, None) => String::new(),
        };
        Ok(format!("redis://{}{}:{}/{}", auth, host, port, db))
    }
}

impl Connector for RedisConnector {
    type Connection = Connection;

    fn kind(&self) -> ResourceKind {
        KIND
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Connection> {
        let timeout = config.timeout_secs("timeout")?;
        let client = Client::open(Self::url(config)?.as_str())
            .map_err(|e| ConnectorError::connection(KIND, describe(&e)))?;

        let conn = match timeout {
            Some(timeout) => client.get_connection_with_timeout(timeout),
            None => client.get_connection(),
        }
        .map_err(|e| ConnectorError::connection(KIND, describe(&e)))?;

        if timeout.is_some() {
            conn.set_read_timeout(timeout)
                .and_then(|_| conn.set_write_timeout(timeout))
                .map_err(|e| ConnectorError::connection(KIND, describe(&e)))?;
        }
        Ok(conn)
    }
}

impl KeyValueSession for Connection {
    fn exists(&mut self, key: &str) -> Result<bool> {
        Commands::exists(self, key).map_err(operation)
    }

    fn get(&mut self, key: &str) -> Result<Option<String>> {
        Commands::get(self, key).map_err(operation)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        Commands::set(self, key, value).map_err(operation)
    }

    fn list_get(&mut self, key: &str) -> Result<Vec<String>> {
        self.lrange(key, 0, -1).map_err(operation)
    }

    fn list_push(&mut self, key: &str, values: &[String]) -> Result<usize> {
        // LPUSH needs at least one value
        if values.is_empty() {
            return self.llen(key).map_err(operation);
        }
        self.lpush(key, values.to_vec()).map_err(operation)
    }
}

fn operation(error: RedisError) -> ConnectorError {
    ConnectorError::operation(KIND, describe(&error))
}
