//! Remote shell adapter.
//!
//! The session stays cached between calls; every command gets a fresh
//! channel. A failed command drops the session so the next call
//! reconnects.

#[cfg(feature = "ssh")]
pub mod ssh;

#[cfg(feature = "ssh")]
pub use ssh::SshConnector;

use crate::cache::{ConnectionCache, Connector};
use crate::config::ConnectionConfig;
use crate::error::Result;
use tracing::{debug, warn};

/// Raw streams of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Remote exit status, when the server reported one.
    pub exit_status: Option<i32>,
}

/// Operations a shell connection supports.
pub trait ShellSession {
    /// Run `command` to completion and collect its output.
    fn run(&mut self, command: &str) -> Result<CommandOutput>;
}

/// Outcome class of a command, decided by its error stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    /// Something was written to stderr.
    Failed,
    /// stderr was blank.
    Succeeded,
}

impl ExecStatus {
    /// Numeric status: 200 for failure, 201 for success.
    pub fn code(self) -> u16 {
        match self {
            ExecStatus::Failed => 200,
            ExecStatus::Succeeded => 201,
        }
    }
}

/// Classified command result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub status: ExecStatus,
    /// stderr for failures, stdout otherwise.
    pub output: String,
}

impl From<CommandOutput> for ExecResult {
    fn from(output: CommandOutput) -> Self {
        if output.stderr.trim().is_empty() {
            ExecResult {
                status: ExecStatus::Succeeded,
                output: output.stdout,
            }
        } else {
            ExecResult {
                status: ExecStatus::Failed,
                output: output.stderr,
            }
        }
    }
}

/// Cached remote shell session.
pub struct ShellStore<C: Connector> {
    cache: ConnectionCache<C>,
}

impl<C> ShellStore<C>
where
    C: Connector,
    C::Connection: ShellSession,
{
    pub fn new(connector: C) -> Self {
        Self {
            cache: ConnectionCache::new(connector),
        }
    }

    /// Run `command` and classify the result.
    pub fn exec(&self, config: &ConnectionConfig, command: &str) -> Result<ExecResult> {
        let outcome = {
            let mut session = self.cache.ensure(config)?;
            session.run(command)
        };

        match outcome {
            Ok(output) => {
                let result = ExecResult::from(output);
                debug!(command, status = result.status.code(), "Command finished");
                Ok(result)
            }
            Err(e) => {
                warn!(command, error = %e, "Command failed, dropping session");
                self.cache.invalidate();
                Err(e)
            }
        }
    }

    pub fn cache(&self) -> &ConnectionCache<C> {
        &self.cache
    }
}

#[cfg(feature = "ssh")]
impl ShellStore<SshConnector> {
    /// Store backed by SSH.
    pub fn ssh() -> Self {
        Self::new(SshConnector)
    }
}
