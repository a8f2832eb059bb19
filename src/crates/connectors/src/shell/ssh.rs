//! SSH backend.

use super::{CommandOutput, ShellSession};
use crate::cache::Connector;
use crate::config::ConnectionConfig;
use crate::error::{describe, ConnectorError, ResourceKind, Result};
use ssh2::{Channel, Session};
use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const DEFAULT_PORT: u16 = 22;
const KIND: ResourceKind = ResourceKind::Shell;
const STDOUT_STREAM: i32 = 0;
const STDERR_STREAM: i32 = 1;
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Opens password-authenticated SSH sessions.
///
/// Keys: `hostname`, `port` (22), `username`, `password`, `timeout` in
/// milliseconds, `pty` (true) to run commands on a pseudo-terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

/// Authenticated session plus per-command settings.
pub struct SshSession {
    session: Session,
    pty: bool,
}

fn connection_error(error: impl std::error::Error) -> ConnectorError {
    ConnectorError::connection(KIND, describe(&error))
}

fn operation_error(error: impl std::error::Error) -> ConnectorError {
    ConnectorError::operation(KIND, describe(&error))
}

fn open_stream(host: &str, port: u16, timeout: Option<Duration>) -> Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs().map_err(connection_error)?.collect();
    let mut last_error = None;
    for addr in addrs {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    Err(match last_error {
        Some(e) => connection_error(e),
        None => ConnectorError::connection(KIND, format!("no address found for {}:{}", host, port)),
    })
}

impl Connector for SshConnector {
    type Connection = SshSession;

    fn kind(&self) -> ResourceKind {
        KIND
    }

    fn connect(&self, config: &ConnectionConfig) -> Result<SshSession> {
        let host = config.require("hostname")?;
        let port = config.parse_or("port", DEFAULT_PORT)?;
        let username = config.require("username")?;
        let password = config.get_or("password", "");
        let timeout = config.timeout_millis("timeout")?;
        let pty = config.flag_or("pty", true)?;

        let stream = open_stream(host, port, timeout)?;
        let mut session = Session::new().map_err(connection_error)?;
        if let Some(timeout) = timeout {
            session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        }
        session.set_tcp_stream(stream);
        session.handshake().map_err(connection_error)?;
        session
            .userauth_password(username, password)
            .map_err(connection_error)?;
        if !session.authenticated() {
            return Err(ConnectorError::connection(
                KIND,
                format!("authentication failed for {}@{}", username, host),
            ));
        }

        debug!(host, port, username, "SSH session established");
        Ok(SshSession { session, pty })
    }
}

impl ShellSession for SshSession {
    fn run(&mut self, command: &str) -> Result<CommandOutput> {
        let mut channel = self.session.channel_session().map_err(operation_error)?;
        if self.pty {
            channel
                .request_pty("xterm", None, None)
                .map_err(operation_error)?;
        }
        channel.exec(command).map_err(operation_error)?;

        let idle_timeout = match self.session.timeout() {
            0 => None,
            ms => Some(Duration::from_millis(u64::from(ms))),
        };
        self.session.set_blocking(false);
        let output = read_output(&mut channel, idle_timeout);
        self.session.set_blocking(true);
        let (stdout, stderr) = output.map_err(operation_error)?;

        channel.wait_close().map_err(operation_error)?;
        let exit_status = channel.exit_status().ok();

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_status,
        })
    }
}

/// Channel output addressed by extended-data stream id.
trait OutputStreams {
    fn read_stream(&mut self, stream_id: i32, buf: &mut [u8]) -> io::Result<usize>;
    fn at_eof(&self) -> bool;
}

impl OutputStreams for Channel {
    fn read_stream(&mut self, stream_id: i32, buf: &mut [u8]) -> io::Result<usize> {
        self.stream(stream_id).read(buf)
    }

    fn at_eof(&self) -> bool {
        self.eof()
    }
}

/// Read whatever one stream has buffered. Returns whether anything arrived.
fn pump(streams: &mut impl OutputStreams, stream_id: i32, buf: &mut [u8], out: &mut Vec<u8>) -> io::Result<bool> {
    let mut progressed = false;
    loop {
        match streams.read_stream(stream_id, buf) {
            Ok(0) => return Ok(progressed),
            Ok(n) => {
                out.extend_from_slice(&buf[..n]);
                progressed = true;
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(progressed),
            Err(e) => return Err(e),
        }
    }
}

/// Drain stdout and stderr together until the remote side closes.
///
/// The session must be non-blocking. A command that fills its stderr
/// window while stdout is idle keeps making progress.
fn read_output(
    streams: &mut impl OutputStreams,
    idle_timeout: Option<Duration>,
) -> io::Result<(Vec<u8>, Vec<u8>)> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut buf = [0u8; 8192];
    let mut last_progress = Instant::now();

    loop {
        let eof = streams.at_eof();
        let progressed = pump(streams, STDOUT_STREAM, &mut buf, &mut stdout)?
            | pump(streams, STDERR_STREAM, &mut buf, &mut stderr)?;
        if eof {
            return Ok((stdout, stderr));
        }
        if progressed {
            last_progress = Instant::now();
            continue;
        }
        if let Some(limit) = idle_timeout {
            if last_progress.elapsed() >= limit {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no output for {:?}", limit),
                ));
            }
        }
        thread::sleep(POLL_INTERVAL);
    }
}
