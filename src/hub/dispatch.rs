//! Reader/router loop.
//!
//! Two futures run joined for the life of a session:
//!
//! - **Reader**: reads one socket message at a time, skips keep-alives,
//!   decodes the rest into [`Frame`]s and hands them over an unbuffered
//!   channel.
//! - **Router**: feeds each frame to the invocation registry, then to the
//!   callback registry. When the loop stops it tears both registries down
//!   and closes the socket.
//!
//! A reader error cancels the group. The router's cleanup always finishes
//! before [`run`] returns.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::protocol::Frame;
use crate::transport::{Socket, SocketMessage};

use super::callbacks::CallbackRegistry;
use super::invocations::InvocationRegistry;

// ============================================================================
// Scope
// ============================================================================

/// Stop conditions shared by both halves of the loop.
pub(crate) struct Scope<'a> {
    /// Cancelled by the caller of `run`, or by the loop on failure.
    pub(crate) group: CancellationToken,
    /// Cancelled when the session is closed.
    pub(crate) shutdown: &'a CancellationToken,
}

impl Scope<'_> {
    fn is_stopped(&self) -> bool {
        self.group.is_cancelled() || self.shutdown.is_cancelled()
    }

    async fn stopped(&self) {
        tokio::select! {
            _ = self.group.cancelled() => {}
            _ = self.shutdown.cancelled() => {}
        }
    }
}

// ============================================================================
// Loop
// ============================================================================

/// Runs the loop until the scope stops or the reader fails.
///
/// Returns `Ok(())` on a requested stop and the reader's error otherwise.
pub(crate) async fn run(
    socket: &dyn Socket,
    invocations: &InvocationRegistry,
    callbacks: &CallbackRegistry,
    scope: Scope<'_>,
) -> Result<()> {
    let (frames_tx, frames_rx) = mpsc::channel(1);

    let ((), read_result) = tokio::join!(
        route(frames_rx, socket, invocations, callbacks, &scope),
        read(socket, frames_tx, &scope),
    );

    read_result
}

/// Reader half.
async fn read(socket: &dyn Socket, frames: mpsc::Sender<Frame>, scope: &Scope<'_>) -> Result<()> {
    let result = read_frames(socket, &frames, scope).await;

    match result {
        Err(e) if scope.is_stopped() => {
            trace!(error = %e, "Read ended after stop");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Reader failed, stopping session");
            scope.group.cancel();
            Err(e)
        }
        Ok(()) => Ok(()),
    }
}

async fn read_frames(
    socket: &dyn Socket,
    frames: &mpsc::Sender<Frame>,
    scope: &Scope<'_>,
) -> Result<()> {
    loop {
        let message = tokio::select! {
            biased;
            () = scope.stopped() => return Ok(()),
            message = socket.read_message() => message?,
        };

        let frame = match message {
            SocketMessage::Text(text) => {
                if Frame::is_keep_alive(&text) {
                    trace!("Keep-alive");
                    continue;
                }
                Frame::parse(&text)?
            }
            SocketMessage::Binary(bytes) => Frame::parse_bytes(&bytes)?,
        };

        tokio::select! {
            biased;
            () = scope.stopped() => return Ok(()),
            sent = frames.send(frame) => {
                if sent.is_err() {
                    return Ok(());
                }
            }
        }
    }
}

/// Router half.
async fn route(
    mut frames: mpsc::Receiver<Frame>,
    socket: &dyn Socket,
    invocations: &InvocationRegistry,
    callbacks: &CallbackRegistry,
    scope: &Scope<'_>,
) {
    loop {
        let frame = tokio::select! {
            biased;
            () = scope.stopped() => break,
            frame = frames.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        invocations.process(&frame);

        tokio::select! {
            biased;
            () = scope.stopped() => break,
            () = callbacks.process(&frame) => {}
        }
    }

    // Unblock a reader still waiting on the socket
    scope.group.cancel();

    invocations.remove_all();
    callbacks.remove_all();

    if let Err(e) = socket.close().await {
        debug!(error = %e, "Socket close failed");
    }

    debug!("Dispatch loop stopped");
}
