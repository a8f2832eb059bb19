//! Fingerprint-keyed connection cache.
//!
//! Every store owns one [`ConnectionCache`]. The cache holds at most one
//! live connection, tagged with the fingerprint of the configuration that
//! produced it:
//!
//! ```text
//! ensure(config)
//!   ├─ empty slot            → connect
//!   ├─ fingerprint mismatch  → drop old handle, connect
//!   └─ fingerprint match     → probe ─ ok   → reuse
//!                                    └─ fail → reconnect with the same config
//! ```
//!
//! The slot sits behind a mutex. The handle returned by [`ensure`] is the
//! lock guard itself, so the fingerprint check and the operation that
//! follows run without another caller swapping the connection in between.
//!
//! [`ensure`]: ConnectionCache::ensure

use crate::config::ConnectionConfig;
use crate::error::{ConnectorError, ResourceKind, Result};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use tooling::logging::{titled, LogLevel};
use tooling::Fingerprint;
use tracing::{debug, info, warn};

/// Exclusive access to a cached connection.
///
/// Holding the handle blocks other callers of the same cache; drop it
/// before calling back into the cache.
pub type ConnectionHandle<'a, T> = MappedMutexGuard<'a, T>;

/// Opens connections of one resource kind.
pub trait Connector {
    /// Live connection produced by [`connect`](Self::connect).
    type Connection;

    /// Resource kind, used in errors and log records.
    fn kind(&self) -> ResourceKind;

    /// Open a new connection from `config`.
    fn connect(&self, config: &ConnectionConfig) -> Result<Self::Connection>;

    /// Check a cached connection before it is reused.
    ///
    /// The default trusts every connection whose fingerprint matches.
    fn probe(&self, _connection: &mut Self::Connection) -> Result<()> {
        Ok(())
    }
}

struct Cached<T> {
    fingerprint: Fingerprint,
    connection: T,
}

/// Holds at most one connection, keyed by configuration fingerprint.
pub struct ConnectionCache<C: Connector> {
    connector: C,
    slot: Mutex<Option<Cached<C::Connection>>>,
}

impl<C: Connector> ConnectionCache<C> {
    /// Create an empty cache.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            slot: Mutex::new(None),
        }
    }

    /// The connector used to open connections.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Return a connection for `config`, connecting or reconnecting as needed.
    pub fn ensure(&self, config: &ConnectionConfig) -> Result<ConnectionHandle<'_, C::Connection>> {
        let fingerprint = config.fingerprint();
        let kind = self.connector.kind();
        let mut slot = self.slot.lock();

        let reusable = match slot.as_mut() {
            None => {
                debug!(%kind, "No cached connection");
                false
            }
            Some(cached) if cached.fingerprint != fingerprint => {
                info!(%kind, old = %cached.fingerprint, new = %fingerprint, "Configuration changed, reconnecting");
                false
            }
            Some(cached) => match self.connector.probe(&mut cached.connection) {
                Ok(()) => true,
                Err(e) => {
                    warn!(%kind, error = %e, "Health probe failed, reconnecting");
                    false
                }
            },
        };

        if !reusable {
            self.establish(&mut slot, config, fingerprint)?;
        }
        self.handle(slot)
    }

    /// Open a new connection for `config`, replacing any cached one.
    ///
    /// On failure the cache is left empty.
    pub fn connect(&self, config: &ConnectionConfig) -> Result<ConnectionHandle<'_, C::Connection>> {
        let mut slot = self.slot.lock();
        self.establish(&mut slot, config, config.fingerprint())?;
        self.handle(slot)
    }

    /// Drop the cached connection. Returns whether one was cached.
    pub fn invalidate(&self) -> bool {
        let dropped = self.slot.lock().take().is_some();
        if dropped {
            debug!(kind = %self.connector.kind(), "Cached connection dropped");
        }
        dropped
    }

    /// Fingerprint of the cached connection, if any.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.slot.lock().as_ref().map(|cached| cached.fingerprint)
    }

    /// Whether a connection is cached.
    pub fn is_connected(&self) -> bool {
        self.slot.lock().is_some()
    }

    fn establish(
        &self,
        slot: &mut Option<Cached<C::Connection>>,
        config: &ConnectionConfig,
        fingerprint: Fingerprint,
    ) -> Result<()> {
        let kind = self.connector.kind();
        *slot = None;

        match self.connector.connect(config) {
            Ok(connection) => {
                info!(%kind, %fingerprint, "Connected");
                *slot = Some(Cached {
                    fingerprint,
                    connection,
                });
                Ok(())
            }
            Err(e) => {
                titled(
                    LogLevel::Error,
                    &format!("{} init failed, please check the config", kind),
                    &[&e, &format_args!("{:?}", config)],
                );
                Err(e)
            }
        }
    }

    fn handle<'a>(
        &self,
        slot: MutexGuard<'a, Option<Cached<C::Connection>>>,
    ) -> Result<ConnectionHandle<'a, C::Connection>> {
        MutexGuard::try_map(slot, |slot| slot.as_mut().map(|cached| &mut cached.connection))
            .map_err(|_| ConnectorError::connection(self.connector.kind(), "not connected"))
    }
}
