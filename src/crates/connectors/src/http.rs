//! Blocking HTTP plumbing shared by the InfluxDB and S3 adapters.
//!
//! ```rust,ignore
//! use connectors::http::{ClientConfig, HttpClient};
//! use connectors::ResourceKind;
//!
//! let client = HttpClient::new(
//!     ResourceKind::TimeSeries,
//!     ClientConfig::new("http://10.0.0.5:8086").with_timeout(Duration::from_secs(5)),
//! )?;
//! let pong = client.send(client.request(Method::GET, "/ping"))?;
//! ```

use crate::error::{describe, ConnectorError, ResourceKind, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::debug;

const ERROR_BODY_LIMIT: usize = 512;

/// Settings for an [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme, host and port, without a trailing slash.
    pub base_url: String,
    /// Whole-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// User agent string.
    pub user_agent: String,
}

impl ClientConfig {
    /// Configuration for `base_url` with no timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
            user_agent: concat!("wlfkit-connectors/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Blocking client bound to one base URL.
pub struct HttpClient {
    kind: ResourceKind,
    config: ClientConfig,
    client: Client,
}

impl HttpClient {
    /// Build a client. Failures are reported as connection errors of `kind`.
    pub fn new(kind: ResourceKind, config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout).connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConnectorError::connection(kind, describe(&e)))?;
        Ok(Self {
            kind,
            config,
            client,
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    /// Start a request for `path`.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send a request and return the response regardless of status.
    pub fn send_raw(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .map_err(|e| ConnectorError::operation(self.kind, describe(&e)))?;
        debug!(kind = %self.kind, status = %response.status(), url = %response.url(), "HTTP response");
        Ok(response)
    }

    /// Send a request, turning non-2xx statuses into operation errors.
    pub fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.send_raw(request)?;
        check_status(self.kind, response)
    }
}

/// Pass 2xx responses through; otherwise build an error from the body.
pub fn check_status(kind: ResourceKind, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(ConnectorError::operation(kind, status_message(status, &body)))
}

/// Error message for an unexpected status, with a bounded excerpt of the body.
pub fn status_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {}", status);
    }
    let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    if excerpt.len() < body.len() {
        format!("HTTP {}: {}...", status, excerpt)
    } else {
        format!("HTTP {}: {}", status, excerpt)
    }
}
