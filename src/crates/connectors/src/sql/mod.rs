//! Relational store adapter.
//!
//! [`SqlStore`] pairs a [`ConnectionCache`] with any connector whose
//! connections speak [`SqlSession`]. The MySQL backend lives in
//! [`mysql`](self::mysql) behind the `mysql` feature.

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "mysql")]
pub use self::mysql::MysqlConnector;

use crate::cache::{ConnectionCache, Connector};
use crate::config::ConnectionConfig;
use crate::error::Result;
use tracing::debug;

/// One result row, column values in select order.
pub type SqlRow = Vec<serde_json::Value>;

/// Operations a relational connection supports.
pub trait SqlSession {
    /// Cheap liveness check.
    fn ping(&mut self) -> Result<()>;

    /// Run a query and collect every row.
    fn query(&mut self, sql: &str) -> Result<Vec<SqlRow>>;

    /// Run a statement inside a transaction and commit it.
    fn execute(&mut self, sql: &str) -> Result<()>;
}

/// Cached relational connection.
pub struct SqlStore<C: Connector> {
    cache: ConnectionCache<C>,
}

impl<C> SqlStore<C>
where
    C: Connector,
    C::Connection: SqlSession,
{
    pub fn new(connector: C) -> Self {
        Self {
            cache: ConnectionCache::new(connector),
        }
    }

    /// Run `sql` and return all rows.
    pub fn get(&self, config: &ConnectionConfig, sql: &str) -> Result<Vec<SqlRow>> {
        let mut conn = self.cache.ensure(config)?;
        let rows = conn.query(sql)?;
        debug!(rows = rows.len(), "SQL query finished");
        Ok(rows)
    }

    /// Run `sql` and commit.
    pub fn save(&self, config: &ConnectionConfig, sql: &str) -> Result<()> {
        let mut conn = self.cache.ensure(config)?;
        conn.execute(sql)
    }

    /// The underlying cache.
    pub fn cache(&self) -> &ConnectionCache<C> {
        &self.cache
    }
}

#[cfg(feature = "mysql")]
impl SqlStore<MysqlConnector> {
    /// Store backed by MySQL.
    pub fn mysql() -> Self {
        Self::new(MysqlConnector)
    }
}
