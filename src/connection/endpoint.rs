//! Handshake URL construction.
//!
//! Every handshake step targets `{endpoint}/{command}` on the same host with
//! a shared set of query parameters:
//!
//! | Parameter | Steps |
//! |-----------|-------|
//! | `clientProtocol` | all |
//! | `connectionData` | all |
//! | `connectionToken` | all, once negotiated |
//! | `messageId` | reconnect |
//! | `transport=webSockets` | connect, start, reconnect |
//!
//! Example connect URL:
//!
//! ```text
//! wss://socket.example.com/signalr/connect?
//!   clientProtocol=1.5&
//!   connectionData=%5B%7B%22name%22%3A%22corehub%22%7D%5D&
//!   connectionToken=<token>&
//!   transport=webSockets
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Transport name sent with every post-negotiate step.
const TRANSPORT: &str = "webSockets";

// ============================================================================
// Scheme
// ============================================================================

/// HTTP scheme of the handshake requests.
///
/// The socket scheme follows it: `https` upgrades to `wss`, `http` to `ws`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    /// Plain HTTP, socket over `ws`.
    Http,
    /// HTTPS, socket over `wss`.
    #[default]
    Https,
}

impl Scheme {
    /// HTTP scheme name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Matching socket scheme name.
    #[inline]
    #[must_use]
    pub const fn socket_scheme(self) -> &'static str {
        match self {
            Self::Http => "ws",
            Self::Https => "wss",
        }
    }

    /// Returns `true` for the encrypted scheme.
    #[inline]
    #[must_use]
    pub const fn is_secure(self) -> bool {
        matches!(self, Self::Https)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// HandshakeCommand
// ============================================================================

/// A handshake step addressed by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeCommand {
    /// Discovery request.
    Negotiate,
    /// Socket upgrade.
    Connect,
    /// Start confirmation.
    Start,
    /// Resume a dropped session from `message_id`.
    ///
    /// Only the URL shape exists. Nothing in this crate issues it.
    Reconnect {
        /// Last message id (`C`) seen by the client.
        message_id: String,
    },
}

impl HandshakeCommand {
    /// Path segment appended to the endpoint.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Negotiate => "negotiate",
            Self::Connect => "connect",
            Self::Start => "start",
            Self::Reconnect { .. } => "reconnect",
        }
    }

    /// Returns `true` if the URL uses the socket scheme.
    #[inline]
    #[must_use]
    pub const fn is_socket(&self) -> bool {
        matches!(self, Self::Connect | Self::Reconnect { .. })
    }
}

// ============================================================================
// Endpoint
// ============================================================================

/// Where the SignalR service lives and what every request carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    path: String,
    connection_data: String,
    protocol_version: String,
}

impl Endpoint {
    /// Creates an endpoint.
    ///
    /// `connection_data` is the raw value (typically a JSON hub list). It is
    /// escaped when URLs are built.
    #[must_use]
    pub fn new(
        scheme: Scheme,
        host: impl Into<String>,
        path: impl Into<String>,
        connection_data: impl Into<String>,
        protocol_version: impl Into<String>,
    ) -> Self {
        Self {
            scheme,
            host: host.into(),
            path: path.into(),
            connection_data: connection_data.into(),
            protocol_version: protocol_version.into(),
        }
    }

    /// HTTP scheme.
    #[inline]
    #[must_use]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Host (with optional port).
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Current endpoint path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw connection data.
    #[inline]
    #[must_use]
    pub fn connection_data(&self) -> &str {
        &self.connection_data
    }

    /// Replaces the endpoint path with the one the server returned.
    pub(crate) fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Builds the URL for `command`.
    ///
    /// `connection_token` must already be URL-escaped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if host or path do not form a valid URL.
    pub fn url(&self, command: &HandshakeCommand, connection_token: Option<&str>) -> Result<Url> {
        let scheme = if command.is_socket() {
            self.scheme.socket_scheme()
        } else {
            self.scheme.as_str()
        };

        let mut url = Url::parse(&format!("{scheme}://{}", self.host))?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(Error::config(format!("invalid host: {:?}", self.host)));
        }

        let base = self.path.trim_end_matches('/');
        let path = if base.starts_with('/') || base.is_empty() {
            format!("{base}/{}", command.name())
        } else {
            format!("/{base}/{}", command.name())
        };
        url.set_path(&path);

        // Keys in sorted order
        let mut params: Vec<(&str, String)> = vec![
            ("clientProtocol", urlencoding::encode(&self.protocol_version).into_owned()),
            ("connectionData", urlencoding::encode(&self.connection_data).into_owned()),
        ];
        if let Some(token) = connection_token.filter(|t| !t.is_empty()) {
            params.push(("connectionToken", token.to_string()));
        }
        if let HandshakeCommand::Reconnect { message_id } = command {
            params.push(("messageId", urlencoding::encode(message_id).into_owned()));
        }
        if *command != HandshakeCommand::Negotiate {
            params.push(("transport", TRANSPORT.to_string()));
        }

        let query = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));

        Ok(url)
    }
}

// ============================================================================
// Tests
// ============================================================================
