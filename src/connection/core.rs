//! Established connection produced by the handshake.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::identifiers::ConnectionId;
use crate::protocol::NegotiateResponse;
use crate::transport::Socket;

use super::options::ConnectionOptions;

// ============================================================================
// SessionInfo
// ============================================================================

/// Metadata negotiated for a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionInfo {
    /// Server-issued connection id.
    pub connection_id: ConnectionId,
    /// URL-escaped connection token.
    pub connection_token: String,
    /// Endpoint path adopted from negotiate.
    pub endpoint_path: String,
    /// Full negotiate response, timing fields included.
    pub negotiate: NegotiateResponse,
}

// ============================================================================
// Connection
// ============================================================================

/// A socket that finished the handshake and is ready for hub traffic.
///
/// Hand it to [`Client::new`](crate::Client::new).
pub struct Connection {
    socket: Arc<dyn Socket>,
    session: SessionInfo,
    options: ConnectionOptions,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("session", &self.session)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Wraps a ready socket with its session metadata.
    #[must_use]
    pub fn new(socket: Arc<dyn Socket>, session: SessionInfo, options: ConnectionOptions) -> Self {
        Self {
            socket,
            session,
            options,
        }
    }

    /// Wraps a socket that is already application-ready, skipping the
    /// handshake.
    ///
    /// Session metadata is left empty.
    #[must_use]
    pub fn from_socket(socket: impl Socket + 'static, options: ConnectionOptions) -> Self {
        Self::new(Arc::new(socket), SessionInfo::default(), options)
    }

    /// Session metadata.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &SessionInfo {
        &self.session
    }

    /// Options the connection was opened with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Splits into parts.
    pub(crate) fn into_parts(self) -> (Arc<dyn Socket>, SessionInfo, ConnectionOptions) {
        (self.socket, self.session, self.options)
    }
}

// ============================================================================
// Tests
// ============================================================================
