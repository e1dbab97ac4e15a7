//! Builder pattern for connection configuration.
//!
//! Provides a fluent API for configuring and running the handshake.
//!
//! # Example
//!
//! ```no_run
//! use signalr_client::{Client, ConnectionBuilder};
//!
//! # async fn example() -> signalr_client::Result<()> {
//! let connection = ConnectionBuilder::new()
//!     .host("socket.example.com")
//!     .endpoint("/signalr")
//!     .connection_data(r#"[{"name":"corehub"}]"#)
//!     .connect()
//!     .await?;
//!
//! let client = Client::new("corehub", connection);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::transport::{Dialer, HttpClient, ReqwestClient, WebSocketDialer};

use super::core::Connection;
use super::endpoint::{Endpoint, Scheme};
use super::handshake::Handshake;
use super::options::ConnectionOptions;

// ============================================================================
// Constants
// ============================================================================

/// Endpoint path used until negotiate returns the real one.
const DEFAULT_ENDPOINT: &str = "/signalr";

// ============================================================================
// ConnectionBuilder
// ============================================================================

/// Builder for configuring a [`Handshake`].
#[derive(Clone)]
pub struct ConnectionBuilder {
    /// Service host, with optional port.
    host: Option<String>,
    /// Initial endpoint path.
    endpoint: String,
    /// Raw connection data (hub list).
    connection_data: String,
    /// HTTP scheme.
    scheme: Scheme,
    /// Tuning options.
    options: ConnectionOptions,
    /// HTTP client override.
    http: Option<Arc<dyn HttpClient>>,
    /// Dialer override.
    dialer: Option<Arc<dyn Dialer>>,
}

impl fmt::Debug for ConnectionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionBuilder")
            .field("host", &self.host)
            .field("endpoint", &self.endpoint)
            .field("scheme", &self.scheme)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self {
            host: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connection_data: String::new(),
            scheme: Scheme::Https,
            options: ConnectionOptions::default(),
            http: None,
            dialer: None,
        }
    }
}

// ============================================================================
// ConnectionBuilder Implementation
// ============================================================================

impl ConnectionBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from a full service address such as
    /// `https://socket.example.com/signalr`.
    ///
    /// The scheme, host (with port) and endpoint path are taken from the
    /// address.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the address does not parse
    /// - [`Error::Config`] if the scheme is not `http`/`https` or the host
    ///   is missing
    pub fn from_url(address: &str) -> Result<Self> {
        let url = Url::parse(address)?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(Error::config(format!(
                    "Unsupported scheme '{other}', expected http or https"
                )));
            }
        };

        let host = url
            .host_str()
            .ok_or_else(|| Error::config(format!("Address has no host: {address}")))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let builder = Self::new().scheme(scheme).host(host);
        Ok(match url.path() {
            "" | "/" => builder,
            path => builder.endpoint(path),
        })
    }

    /// Sets the service host (e.g. `"socket.example.com"` or
    /// `"127.0.0.1:8080"`).
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the initial endpoint path. Defaults to `/signalr`.
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, path: impl Into<String>) -> Self {
        self.endpoint = path.into();
        self
    }

    /// Sets the connection data sent with every request.
    ///
    /// Typically a JSON list of hubs: `[{"name":"corehub"}]`.
    #[inline]
    #[must_use]
    pub fn connection_data(mut self, data: impl Into<String>) -> Self {
        self.connection_data = data.into();
        self
    }

    /// Sets the HTTP scheme. The socket scheme follows it.
    #[inline]
    #[must_use]
    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Uses plain `http` / `ws`.
    #[inline]
    #[must_use]
    pub fn insecure(self) -> Self {
        self.scheme(Scheme::Http)
    }

    /// Replaces all tuning options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the client protocol version.
    #[inline]
    #[must_use]
    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.options.protocol_version = version.into();
        self
    }

    /// Sets the per-message delivery deadline for callbacks.
    #[inline]
    #[must_use]
    pub fn max_message_process_duration(mut self, duration: Duration) -> Self {
        self.options.max_message_process_duration = duration;
        self
    }

    /// Uses a custom HTTP client for negotiate and start.
    #[inline]
    #[must_use]
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http = Some(client);
        self
    }

    /// Uses a custom dialer for the socket upgrade.
    #[inline]
    #[must_use]
    pub fn dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = Some(dialer);
        self
    }

    /// Validates the configuration and returns an idle handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the host is missing or malformed
    /// - [`Error::Config`] if the options are invalid
    /// - [`Error::Http`] if the default HTTP client cannot be created
    pub fn build(self) -> Result<Handshake> {
        let host = self.validate_host()?;
        self.options.validate()?;

        let endpoint = Endpoint::new(
            self.scheme,
            host,
            self.endpoint,
            self.connection_data,
            self.options.protocol_version.clone(),
        );

        let http: Arc<dyn HttpClient> = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestClient::new()?),
        };
        let dialer: Arc<dyn Dialer> = self.dialer.unwrap_or_else(|| Arc::new(WebSocketDialer));

        Ok(Handshake::new(endpoint, self.options, http, dialer))
    }

    /// Builds and runs the full handshake.
    ///
    /// # Errors
    ///
    /// Returns configuration errors from [`build`](Self::build) or the
    /// first handshake step error.
    pub async fn connect(self) -> Result<Connection> {
        self.build()?.run().await
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ConnectionBuilder {
    /// Validates the host configuration.
    fn validate_host(&self) -> Result<String> {
        let host = self.host.clone().ok_or_else(|| {
            Error::config(
                "Host is required. Use .host() to set it.\n\
                 Example: ConnectionBuilder::new().host(\"socket.example.com\")",
            )
        })?;

        let host = host.trim().to_string();
        if host.is_empty() {
            return Err(Error::config("Host must not be empty"));
        }

        if host.contains("://") || host.contains('/') {
            return Err(Error::config(format!(
                "Host must not contain a scheme or path: {host}\n\
                 Use .scheme()/.insecure() and .endpoint() instead."
            )));
        }

        Ok(host)
    }
}

// ============================================================================
// Tests
// ============================================================================
