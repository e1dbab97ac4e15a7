//! In-process socket pair.
//!
//! [`MemorySocket::pair`] returns a [`Socket`] for the client and a
//! [`MemoryPeer`] that plays the server: it pushes frames in and observes
//! what the client wrote. Useful for driving a hub client without a network.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

use super::socket::{Socket, SocketMessage};

// ============================================================================
// MemorySocket
// ============================================================================

/// Client end of an in-process socket pair.
pub struct MemorySocket {
    inbound: Mutex<mpsc::UnboundedReceiver<SocketMessage>>,
    outbound: mpsc::UnboundedSender<String>,
    closed: CancellationToken,
}

/// Server end of an in-process socket pair.
pub struct MemoryPeer {
    to_client: mpsc::UnboundedSender<SocketMessage>,
    from_client: mpsc::UnboundedReceiver<String>,
    closed: CancellationToken,
}

impl MemorySocket {
    /// Creates a connected socket/peer pair.
    #[must_use]
    pub fn pair() -> (Self, MemoryPeer) {
        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();
        let closed = CancellationToken::new();

        let socket = Self {
            inbound: Mutex::new(inbound),
            outbound,
            closed: closed.clone(),
        };
        let peer = MemoryPeer {
            to_client,
            from_client,
            closed,
        };

        (socket, peer)
    }
}

#[async_trait]
impl Socket for MemorySocket {
    async fn read_message(&self) -> Result<SocketMessage> {
        let mut inbound = self.inbound.lock().await;

        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(Error::ConnectionClosed),
            message = inbound.recv() => message.ok_or(Error::ConnectionClosed),
        }
    }

    async fn write_text(&self, text: String) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(Error::ConnectionClosed);
        }

        self.outbound
            .send(text)
            .map_err(|_| Error::ConnectionClosed)
    }

    async fn close(&self) -> Result<()> {
        self.closed.cancel();
        Ok(())
    }
}

// ============================================================================
// MemoryPeer
// ============================================================================

impl MemoryPeer {
    /// Pushes a text frame to the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the client socket is gone.
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(SocketMessage::Text(text.into()))
    }

    /// Pushes any data message to the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the client socket is gone.
    pub fn send(&self, message: SocketMessage) -> Result<()> {
        self.to_client
            .send(message)
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Waits for the next text frame written by the client.
    ///
    /// Returns `None` once the client side is dropped.
    pub async fn recv_text(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Returns `true` once the client closed its socket.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Drops the server end, so the client's next read fails.
    pub fn disconnect(self) {
        drop(self);
    }
}

// ============================================================================
// Tests
// ============================================================================
