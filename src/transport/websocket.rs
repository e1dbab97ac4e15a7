//! WebSocket socket backed by tokio-tungstenite.
//!
//! The stream is split once at construction so the dispatch reader can
//! block on the read half while callers write through the sink half.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};

use super::socket::{Dialer, Socket, SocketMessage};

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream, plain or TLS.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// WebSocket
// ============================================================================

/// A [`Socket`] over an established WebSocket connection.
pub struct WebSocket {
    /// Write half.
    sink: Mutex<SplitSink<WsStream, Message>>,
    /// Read half.
    stream: Mutex<SplitStream<WsStream>>,
    /// Set once `close` has run or the remote closed.
    closed: AtomicBool,
}

impl WebSocket {
    /// Wraps an established stream.
    #[must_use]
    pub fn new(ws_stream: WsStream) -> Self {
        let (sink, stream) = ws_stream.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns `true` once the socket is closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Socket for WebSocket {
    async fn read_message(&self) -> Result<SocketMessage> {
        let mut stream = self.stream.lock().await;

        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(SocketMessage::Text(text.as_str().to_owned()));
                }

                Some(Ok(Message::Binary(bytes))) => {
                    return Ok(SocketMessage::Binary(bytes.to_vec()));
                }

                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "WebSocket closed by remote");
                    self.closed.store(true, Ordering::Release);
                    return Err(Error::ConnectionClosed);
                }

                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    debug!("WebSocket stream ended");
                    self.closed.store(true, Ordering::Release);
                    return Err(Error::ConnectionClosed);
                }

                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket read error");
                    return Err(Error::WebSocket(e));
                }

                // Ping and pong are answered by tungstenite
                Some(Ok(_)) => {
                    trace!("Skipping control frame");
                }
            }
        }
    }

    async fn write_text(&self, text: String) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        self.sink
            .lock()
            .await
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| match e {
                WsError::ConnectionClosed | WsError::AlreadyClosed => Error::ConnectionClosed,
                other => Error::WebSocket(other),
            })
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        match self.sink.lock().await.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                debug!("WebSocket closed");
                Ok(())
            }
            Err(e) => Err(Error::WebSocket(e)),
        }
    }
}

// ============================================================================
// WebSocketDialer
// ============================================================================

/// Default [`Dialer`] using `tokio_tungstenite::connect_async`.
///
/// `wss://` URLs are served over rustls with the webpki root store.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketDialer;

#[async_trait]
impl Dialer for WebSocketDialer {
    async fn dial(&self, url: &Url) -> Result<Box<dyn Socket>> {
        debug!(%url, "Opening WebSocket");

        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((ws_stream, response)) => {
                debug!(status = %response.status(), "WebSocket upgrade complete");
                Ok(Box::new(WebSocket::new(ws_stream)))
            }

            Err(WsError::Http(response)) => {
                let status = response.status().as_u16();
                let body = response
                    .body()
                    .as_ref()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .unwrap_or_default();

                warn!(status, body = %body, "WebSocket upgrade rejected");
                Err(Error::handshake_rejected(status, body))
            }

            Err(e) => Err(Error::connection(format!("WebSocket connect failed: {e}"))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
