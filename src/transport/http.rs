//! HTTP transport implementation.
//!
//! ESPEasy units expose their control interface as unauthenticated HTTP
//! on the local network. The transport is a [`reqwest::Client`] with a
//! bounded per-request timeout and a fixed base URL.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Default HTTP port of an ESPEasy unit.
pub const DEFAULT_PORT: u16 = 80;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host name or IP address of the unit.
    pub host: String,
    /// TCP port of the web interface.
    pub port: u16,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpConfig {
    /// Creates a new HTTP configuration with default settings.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the TCP port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The base URL requests are issued against. The port is omitted
    /// when it is the default, matching the URLs units print themselves.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.port == DEFAULT_PORT {
            format!("http://{}", self.host)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

/// HTTP transport for ESPEasy communication.
pub struct HttpTransport {
    config: HttpConfig,
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a new HTTP transport with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let base_url = config.base_url();
        Ok(Self {
            config,
            client,
            base_url,
        })
    }

    /// Creates a new HTTP transport for the given host with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_host(host: impl Into<String>) -> Result<Self> {
        Self::new(HttpConfig::new(host))
    }

    /// The configuration this transport was built with.
    #[must_use]
    pub const fn config(&self) -> &HttpConfig {
        &self.config
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let url = format!("{}{}", self.base_url, path);
        Box::pin(async move {
            tracing::debug!("GET {}", url);

            let response = self.client.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                tracing::debug!("{} answered {}", url, status);
                return Err(Error::Status {
                    status: status.as_u16(),
                });
            }

            let body = response.text().await?;
            tracing::trace!("received {} bytes from {}", body.len(), url);
            Ok(body)
        })
    }

    fn endpoint(&self) -> String {
        self.base_url.clone()
    }
}
