//! Duplex message channel abstraction.
//!
//! The hub client never touches a concrete socket type. Anything that can
//! read and write discrete text frames implements [`Socket`], and the
//! handshake opens one through a [`Dialer`].

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

// ============================================================================
// SocketMessage
// ============================================================================

/// A data message received from a socket.
///
/// Control frames (ping, pong, close) are handled by the implementation and
/// never surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketMessage {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
}

impl SocketMessage {
    /// Returns the frame kind for diagnostics.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
        }
    }
}

// ============================================================================
// Socket
// ============================================================================

/// A persistent, message-oriented duplex channel.
///
/// Reads and writes may run concurrently from different tasks. Only one task
/// reads at a time in practice.
#[async_trait]
pub trait Socket: Send + Sync {
    /// Waits for the next data message.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) once the
    ///   socket is closed by either side
    /// - [`Error::WebSocket`](crate::Error::WebSocket) on a transport failure
    async fn read_message(&self) -> Result<SocketMessage>;

    /// Sends one text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) if the
    ///   socket is closed
    async fn write_text(&self, text: String) -> Result<()>;

    /// Closes the socket. Calling it again is a no-op.
    async fn close(&self) -> Result<()>;
}

// ============================================================================
// Dialer
// ============================================================================

/// Opens sockets for the connect step of the handshake.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Opens a socket to `url` (`ws://` or `wss://`).
    ///
    /// # Errors
    ///
    /// - [`Error::HandshakeRejected`](crate::Error::HandshakeRejected) if the
    ///   server refuses the upgrade
    /// - [`Error::Connection`](crate::Error::Connection) on other failures
    async fn dial(&self, url: &Url) -> Result<Box<dyn Socket>>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind() {
        assert_eq!(SocketMessage::Text("{}".into()).kind(), "text");
        assert_eq!(SocketMessage::Binary(vec![1]).kind(), "binary");
    }
}
