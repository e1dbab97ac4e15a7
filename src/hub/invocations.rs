//! Pending invocation registry.
//!
//! Correlates outbound hub calls with their responses by [`InvocationId`].
//! Each entry owns the sending half of a oneshot channel, so a result is
//! written at most once and the slot closes right after.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::InvocationId;
use crate::protocol::Frame;

// ============================================================================
// Types
// ============================================================================

/// Outcome delivered to a waiting caller.
type InvocationResult = Result<Value>;

/// Registry-side half of a pending invocation.
struct PendingInvocation {
    method: String,
    cancel: CancellationToken,
    result_tx: oneshot::Sender<InvocationResult>,
}

/// State guarded by the registry lock.
struct InvocationMap {
    next_id: InvocationId,
    pending: FxHashMap<InvocationId, PendingInvocation>,
    closed: bool,
}

// ============================================================================
// InvocationRegistry
// ============================================================================

/// Tracks in-flight invocations.
///
/// The lock covers map mutation only. Delivery happens after the entry has
/// been taken out.
pub(crate) struct InvocationRegistry {
    inner: Mutex<InvocationMap>,
}

impl InvocationRegistry {
    /// Creates an empty registry whose first id is 1.
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(InvocationMap {
                next_id: InvocationId::FIRST,
                pending: FxHashMap::default(),
                closed: false,
            }),
        }
    }

    /// Registers a new invocation under the next id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] once [`remove_all`](Self::remove_all)
    /// has run.
    pub(crate) fn create(&self, cancel: CancellationToken, method: &str) -> Result<Invocation> {
        let (result_tx, result_rx) = oneshot::channel();

        let id = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Err(Error::ConnectionClosed);
            }

            let id = inner.next_id;
            inner.next_id = id.next();
            inner.pending.insert(
                id,
                PendingInvocation {
                    method: method.to_string(),
                    cancel: cancel.clone(),
                    result_tx,
                },
            );
            id
        };

        trace!(%id, method, "Invocation registered");

        Ok(Invocation {
            id,
            method: method.to_string(),
            cancel,
            result_rx,
        })
    }

    /// Unregisters an invocation whose request was never sent.
    ///
    /// The caller's handle then reads as cancelled.
    pub(crate) fn remove(&self, id: InvocationId) {
        if self.inner.lock().pending.remove(&id).is_some() {
            debug!(%id, "Invocation removed before dispatch");
        }
    }

    /// Resolves the invocation a frame answers, if any.
    ///
    /// Frames without a pending id are ignored.
    pub(crate) fn process(&self, frame: &Frame) {
        let Some(id) = frame.invocation_id else {
            return;
        };

        let Some(entry) = self.inner.lock().pending.remove(&id) else {
            trace!(%id, "Response for unknown invocation");
            return;
        };

        let result = match frame.error_message() {
            Some(message) => Err(Error::invocation(&entry.method, id, message)),
            None => Ok(frame.result.clone().unwrap_or(Value::Null)),
        };

        if entry.cancel.is_cancelled() {
            debug!(%id, method = %entry.method, "Dropping result for cancelled invocation");
            return;
        }

        if entry.result_tx.send(result).is_err() {
            trace!(%id, "Invocation handle dropped before result");
        }
    }

    /// Resolves every pending invocation as cancelled and clears the map.
    ///
    /// The registry accepts no new invocations afterwards.
    pub(crate) fn remove_all(&self) {
        let pending: Vec<_> = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            inner.pending.drain().collect()
        };
        let count = pending.len();

        for (_, entry) in pending {
            let _ = entry.result_tx.send(Err(Error::Cancelled));
        }

        if count > 0 {
            debug!(count, "Cancelled pending invocations");
        }
    }

    /// Number of pending invocations.
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }
}

// ============================================================================
// Invocation
// ============================================================================

/// Handle to a pending hub invocation.
///
/// Resolved exactly once: with the server's result, a server error, or
/// cancellation.
#[derive(Debug)]
pub struct Invocation {
    id: InvocationId,
    method: String,
    cancel: CancellationToken,
    result_rx: oneshot::Receiver<InvocationResult>,
}

impl Invocation {
    /// Correlation id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// Invoked method name.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Waits for the raw result value.
    ///
    /// # Errors
    ///
    /// - [`Error::Invocation`] if the server reported an error
    /// - [`Error::Cancelled`] if the caller's scope was cancelled, or the
    ///   session shut down before a response arrived
    pub async fn result(self) -> Result<Value> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            outcome = self.result_rx => outcome.unwrap_or(Err(Error::Cancelled)),
        }
    }

    /// Waits for the result and deserializes it into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`result`](Self::result), plus [`Error::Json`] if the value
    /// does not match `T`.
    pub async fn unmarshal<T: DeserializeOwned>(self) -> Result<T> {
        let value = self.result().await?;
        Ok(serde_json::from_value(value)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
