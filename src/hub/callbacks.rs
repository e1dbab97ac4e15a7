//! Push subscription registry.
//!
//! At most one live [`CallbackStream`] exists per method name. Each push
//! sub-message is delivered under a deadline: a subscriber that leaves its
//! buffer full for longer than `max_message_process_duration` is torn down
//! so it cannot hold up the rest of the session.
//!
//! # Delivery outcomes
//!
//! | Race winner | Effect |
//! |-------------|--------|
//! | Stream cancelled | Entry unregistered, message dropped |
//! | Buffer accepted | Delivered, stream stays live |
//! | Deadline elapsed | Stream cancelled as stalled, entry unregistered |

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{Frame, HubMessage};

// ============================================================================
// Types
// ============================================================================

/// Item carried by a stream buffer.
type CallbackResult = Result<HubMessage>;

/// Registry-side half of a subscription.
#[derive(Clone)]
struct CallbackEntry {
    cancel: CancellationToken,
    tx: mpsc::Sender<CallbackResult>,
    stalled: Arc<AtomicBool>,
}

/// State guarded by the registry lock.
#[derive(Default)]
struct CallbackMap {
    by_method: FxHashMap<String, CallbackEntry>,
    closed: bool,
}

/// How a single delivery attempt ended.
enum Delivery {
    Delivered,
    Cancelled,
    Stalled,
}

// ============================================================================
// CallbackRegistry
// ============================================================================

/// Tracks live push subscriptions by method name.
pub(crate) struct CallbackRegistry {
    entries: Mutex<CallbackMap>,
    max_process_duration: Duration,
    buffer: usize,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    pub(crate) fn new(max_process_duration: Duration, buffer: usize) -> Self {
        Self {
            entries: Mutex::new(CallbackMap::default()),
            max_process_duration,
            buffer: buffer.max(1),
        }
    }

    /// Subscribes to pushes of `method`.
    ///
    /// The stream's scope is a child of `cancel`.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] once [`remove_all`](Self::remove_all)
    ///   has run
    /// - [`Error::DuplicateCallback`] if a live stream for `method` already
    ///   exists
    pub(crate) fn create(&self, cancel: &CancellationToken, method: &str) -> Result<CallbackStream> {
        let mut entries = self.entries.lock();

        if entries.closed {
            return Err(Error::ConnectionClosed);
        }

        if let Some(existing) = entries.by_method.get(method)
            && !existing.cancel.is_cancelled()
        {
            return Err(Error::duplicate_callback(method));
        }

        let (tx, rx) = mpsc::channel(self.buffer);
        let entry = CallbackEntry {
            cancel: cancel.child_token(),
            tx,
            stalled: Arc::new(AtomicBool::new(false)),
        };

        let stream = CallbackStream {
            method: method.to_string(),
            cancel: entry.cancel.clone(),
            rx,
            stalled: Arc::clone(&entry.stalled),
            timeout_ms: duration_ms(self.max_process_duration),
        };

        entries.by_method.insert(method.to_string(), entry);
        drop(entries);

        debug!(method, "Callback registered");
        Ok(stream)
    }

    /// Delivers every push sub-message in `frame`, in order.
    ///
    /// Sub-messages for methods without a subscriber are dropped.
    pub(crate) async fn process(&self, frame: &Frame) {
        for message in &frame.messages {
            let method = message.method.as_str();

            let entry = self.entries.lock().by_method.get(method).cloned();
            let Some(entry) = entry else {
                trace!(method, "No subscriber for push");
                continue;
            };

            let delivery = tokio::select! {
                biased;
                _ = entry.cancel.cancelled() => Delivery::Cancelled,
                sent = entry.tx.send(Ok(message.clone())) => match sent {
                    Ok(()) => Delivery::Delivered,
                    Err(_) => Delivery::Cancelled,
                },
                _ = tokio::time::sleep(self.max_process_duration) => Delivery::Stalled,
            };

            match delivery {
                Delivery::Delivered => trace!(method, "Push delivered"),
                Delivery::Cancelled => {
                    debug!(method, "Subscriber gone, unregistering");
                    self.unregister(method, &entry);
                }
                Delivery::Stalled => {
                    warn!(
                        method,
                        timeout_ms = duration_ms(self.max_process_duration),
                        "Subscriber stalled, closing stream"
                    );
                    entry.stalled.store(true, Ordering::Release);
                    entry.cancel.cancel();
                    self.unregister(method, &entry);
                }
            }
        }
    }

    /// Cancels every live stream and clears the map.
    ///
    /// The registry accepts no new streams afterwards.
    pub(crate) fn remove_all(&self) {
        let entries: Vec<_> = {
            let mut entries = self.entries.lock();
            entries.closed = true;
            entries.by_method.drain().collect()
        };
        let count = entries.len();

        for (method, entry) in entries {
            if entry.cancel.is_cancelled() {
                continue;
            }

            match entry.tx.try_send(Err(Error::Cancelled)) {
                Ok(()) | Err(TrySendError::Closed(_)) => {}
                Err(TrySendError::Full(_)) => {
                    trace!(method, "Buffer full, cancelling stream directly");
                    entry.cancel.cancel();
                }
            }
        }

        if count > 0 {
            debug!(count, "Cancelled callback streams");
        }
    }

    /// Number of registered streams, including ones not yet observed as
    /// closed.
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().by_method.len()
    }

    /// Removes `method` only if it still maps to `entry`.
    fn unregister(&self, method: &str, entry: &CallbackEntry) {
        let mut entries = self.entries.lock();
        if entries
            .by_method
            .get(method)
            .is_some_and(|current| current.tx.same_channel(&entry.tx))
        {
            entries.by_method.remove(method);
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// CallbackStream
// ============================================================================

/// Stream of push messages for one hub method.
///
/// Dropping the stream closes it and frees the method name.
#[derive(Debug)]
pub struct CallbackStream {
    method: String,
    cancel: CancellationToken,
    rx: mpsc::Receiver<CallbackResult>,
    stalled: Arc<AtomicBool>,
    timeout_ms: u64,
}

impl CallbackStream {
    /// Subscribed method name.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns `true` once the stream is closed for any reason.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Waits for the next push message.
    ///
    /// Cancellation is checked before the buffered backlog.
    ///
    /// # Errors
    ///
    /// - [`Error::CallbackStalled`] if the stream was torn down for not
    ///   draining in time
    /// - [`Error::Cancelled`] if the stream or the session was closed
    pub async fn read(&mut self) -> Result<HubMessage> {
        if self.cancel.is_cancelled() {
            return Err(self.closed_error());
        }

        let next = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            item = self.rx.recv() => item,
        };

        match next {
            Some(item) => item,
            None => Err(self.closed_error()),
        }
    }

    /// Waits for the next push message and deserializes its arguments.
    ///
    /// `T` is usually a tuple with one element per argument.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read), plus [`Error::Protocol`] if the
    /// arguments do not match `T`.
    pub async fn read_args<T: DeserializeOwned>(&mut self) -> Result<T> {
        self.read().await?.args()
    }

    /// Closes the stream. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    fn closed_error(&self) -> Error {
        if self.stalled.load(Ordering::Acquire) {
            Error::callback_stalled(&self.method, self.timeout_ms)
        } else {
            Error::Cancelled
        }
    }
}

impl Drop for CallbackStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ============================================================================
// Tests
// ============================================================================
