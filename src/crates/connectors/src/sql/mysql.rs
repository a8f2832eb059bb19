//! MySQL backend.

use super::{SqlRow, SqlSession};
use crate::cache::Connector;
use crate::config::ConnectionConfig;
use crate::error::{describe, ConnectorError, ResourceKind, Result};
use mysql::consts::ColumnType;
use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Row, TxOpts, Value};
use serde_json::Value as Json;

const DEFAULT_PORT: u16 = 3306;

/// Opens MySQL connections.
///
/// Keys: `host`, `port` (3306), `user`, `password`, `database`, and an
/// optional `timeout` in seconds applied to connect, read and write.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlConnector;

impl MysqlConnector {
    fn options(config: &ConnectionConfig) -> Result<OptsBuilder> {
        let timeout = config.timeout_secs("timeout")?;
        Ok(OptsBuilder::new()
            .ip_or_hostname(Some(config.require("host")?))
            .tcp_port(config.parse_or("port", DEFAULT_PORT)?)
            .user(config.get("user"))
            .pass(config.get("password"))
            .db_name(config.get("database").filter(|db| !db.is_empty()))
            .tcp_connect_timeout(timeout)
            .read_timeout(timeout)
            .write_timeout(timeout))
    }
}

impl Connector for MysqlConnector {
    type Connection = Conn;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Sql
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<Conn> {
        let opts = Self::options(config)?;
        Conn::new(opts).map_err(|e| ConnectorError::connection(ResourceKind::Sql, describe(&e)))
    }

    fn probe(&self, connection: &mut Conn) -> Result<()> {
        SqlSession::ping(connection)
    }
}

impl SqlSession for Conn {
    fn ping(&mut self) -> Result<()> {
        self.query_drop("SELECT 1").map_err(operation)
    }

    fn query(&mut self, sql: &str) -> Result<Vec<SqlRow>> {
        let rows: Vec<Row> = Queryable::query(self, sql).map_err(operation)?;
        Ok(rows.iter().map(row_values).collect())
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        let mut tx = self.start_transaction(TxOpts::default()).map_err(operation)?;
        tx.query_drop(sql).map_err(operation)?;
        tx.commit().map_err(operation)
    }
}

fn operation(error: mysql::Error) -> ConnectorError {
    ConnectorError::operation(ResourceKind::Sql, describe(&error))
}

fn row_values(row: &Row) -> SqlRow {
    let columns = row.columns_ref();
    (0..row.len())
        .map(|i| {
            let date_only = columns
                .get(i)
                .map(|c| is_date_column(c.column_type()))
                .unwrap_or(false);
            row.as_ref(i)
                .map(|value| to_json(value, date_only))
                .unwrap_or(Json::Null)
        })
        .collect()
}

fn is_date_column(column_type: ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE
    )
}

/// Map a wire value to JSON. Text columns arrive as bytes.
///
/// `date_only` renders `DATE` columns without a time part; `DATETIME`
/// and `TIMESTAMP` always carry one, midnight included.
fn to_json(value: &Value, date_only: bool) -> Json {
    match value {
        Value::NULL => Json::Null,
        Value::Int(v) => Json::from(*v),
        Value::UInt(v) => Json::from(*v),
        Value::Float(v) => Json::from(f64::from(*v)),
        Value::Double(v) => Json::from(*v),
        Value::Bytes(bytes) => Json::String(String::from_utf8_lossy(bytes).into_owned()),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            if date_only {
                Json::String(format!("{:04}-{:02}-{:02}", year, month, day))
            } else {
                Json::String(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
                    year, month, day, hour, minute, second, micros
                ))
            }
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            let hours = u32::from(*hours) + days * 24;
            Json::String(format!(
                "{}{:02}:{:02}:{:02}.{:06}",
                sign, hours, minutes, seconds, micros
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_require_host() {
        let config = ConnectionConfig::new().with("user", "admin");
        assert!(matches!(
            MysqlConnector::options(&config),
            Err(ConnectorError::Config(_))
        ));
    }

    #[test]
    fn test_options_reject_bad_port() {
        let config = ConnectionConfig::new().with("host", "h").with("port", "mysql");
        assert!(MysqlConnector::options(&config).is_err());
    }

    #[test]
    fn test_to_json() {
        assert_eq!(to_json(&Value::NULL, false), Json::Null);
        assert_eq!(to_json(&Value::Int(-3), false), Json::from(-3));
        assert_eq!(to_json(&Value::Bytes(b"wlf".to_vec()), false), Json::from("wlf"));
        assert_eq!(to_json(&Value::Date(2024, 3, 9, 0, 0, 0, 0), true), Json::from("2024-03-09"));
        assert_eq!(
            to_json(&Value::Date(2024, 3, 9, 8, 5, 1, 0), false),
            Json::from("2024-03-09 08:05:01.000000")
        );
        assert_eq!(
            to_json(&Value::Time(true, 1, 2, 3, 4, 0), false),
            Json::from("-26:03:04.000000")
        );
    }

    #[test]
    fn test_midnight_datetime_keeps_time_part() {
        assert_eq!(
            to_json(&Value::Date(2024, 3, 9, 0, 0, 0, 0), false),
            Json::from("2024-03-09 00:00:00.000000")
        );
        assert!(is_date_column(ColumnType::MYSQL_TYPE_DATE));
        assert!(is_date_column(ColumnType::MYSQL_TYPE_NEWDATE));
        assert!(!is_date_column(ColumnType::MYSQL_TYPE_DATETIME));
        assert!(!is_date_column(ColumnType::MYSQL_TYPE_TIMESTAMP));
    }

    #[test]
    fn test_unreachable_server_is_connection_error() {
        let config = ConnectionConfig::new()
            .with("host", "127.0.0.1")
            .with("port", 1)
            .with("timeout", 1);
        let err = MysqlConnector.connect(&config).err().unwrap();
        assert!(err.is_connection());
    }
}
