//! Key-value store adapter.
//!
//! Every call takes the configuration and goes through the cache, so a
//! changed configuration reconnects just like the other stores.

#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "redis")]
pub use self::redis::RedisConnector;

use crate::cache::{ConnectionCache, Connector};
use crate::config::ConnectionConfig;
use crate::error::Result;

/// Operations a key-value connection supports.
pub trait KeyValueSession {
    fn exists(&mut self, key: &str) -> Result<bool>;

    /// String value of `key`; `None` when the key is unset.
    fn get(&mut self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// The whole list stored at `key`, head first.
    fn list_get(&mut self, key: &str) -> Result<Vec<String>>;

    /// Push `values` onto the head of the list, one after another.
    /// Returns the list length afterwards.
    fn list_push(&mut self, key: &str, values: &[String]) -> Result<usize>;
}

/// Cached key-value connection.
pub struct KeyValueStore<C: Connector> {
    cache: ConnectionCache<C>,
}

impl<C> KeyValueStore<C>
where
    C: Connector,
    C::Connection: KeyValueSession,
{
    pub fn new(connector: C) -> Self {
        Self {
            cache: ConnectionCache::new(connector),
        }
    }

    pub fn exists(&self, config: &ConnectionConfig, key: &str) -> Result<bool> {
        self.cache.ensure(config)?.exists(key)
    }

    pub fn get(&self, config: &ConnectionConfig, key: &str) -> Result<Option<String>> {
        self.cache.ensure(config)?.get(key)
    }

    pub fn set(&self, config: &ConnectionConfig, key: &str, value: &str) -> Result<()> {
        self.cache.ensure(config)?.set(key, value)
    }

    pub fn list_get(&self, config: &ConnectionConfig, key: &str) -> Result<Vec<String>> {
        self.cache.ensure(config)?.list_get(key)
    }

    pub fn list_push<V: AsRef<str>>(&self, config: &ConnectionConfig, key: &str, values: &[V]) -> Result<usize> {
        let values: Vec<String> = values.iter().map(|v| v.as_ref().to_string()).collect();
        self.cache.ensure(config)?.list_push(key, &values)
    }

    pub fn cache(&self) -> &ConnectionCache<C> {
        &self.cache
    }
}

#[cfg(feature = "redis")]
impl KeyValueStore<RedisConnector> {
    /// Store backed by Redis.
    pub fn redis() -> Self {
        Self::new(RedisConnector)
    }
}
