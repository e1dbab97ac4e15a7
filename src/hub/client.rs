//! Hub client.
//!
//! [`Client`] owns an established session: the socket, both registries and
//! the session scope. It is cheap to clone, so one task can drive
//! [`run`](Client::run) while others invoke methods and read pushes.
//!
//! # Example
//!
//! ```no_run
//! use signalr_client::{Client, ConnectionBuilder};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> signalr_client::Result<()> {
//! let client = Client::connect(
//!     "corehub",
//!     ConnectionBuilder::new()
//!         .host("socket.example.com")
//!         .connection_data(r#"[{"name":"corehub"}]"#),
//! )
//! .await?;
//!
//! let runner = {
//!     let client = client.clone();
//!     tokio::spawn(async move { client.run(CancellationToken::new()).await })
//! };
//!
//! let mut deltas = client.callback("uE")?;
//! let state: serde_json::Value = client.call("QueryExchangeState", ("BTC-ETH",)).await?;
//!
//! while let Ok(message) = deltas.read().await {
//!     println!("{}: {:?}", message.method, message.args);
//! }
//!
//! client.close().await?;
//! # let _ = (state, runner);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::connection::{Connection, ConnectionBuilder, ConnectionOptions, SessionInfo};
use crate::error::{Error, Result};
use crate::protocol::{HubArgs, HubMessage};
use crate::transport::Socket;

use super::callbacks::{CallbackRegistry, CallbackStream};
use super::dispatch::{self, Scope};
use super::invocations::{Invocation, InvocationRegistry};

// ============================================================================
// Session
// ============================================================================

/// Shared session state.
struct Session {
    hub: String,
    socket: Arc<dyn Socket>,
    info: SessionInfo,
    options: ConnectionOptions,
    invocations: InvocationRegistry,
    callbacks: CallbackRegistry,
    shutdown: CancellationToken,
    closed: AtomicBool,
    running: AtomicBool,
}

// ============================================================================
// Client
// ============================================================================

/// Hub client bound to one established session.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Session>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("hub", &self.inner.hub)
            .field("connection_id", &self.inner.info.connection_id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Wraps an established connection.
    ///
    /// Outbound invocations carry `hub` as their `H` field. An empty name
    /// omits it.
    #[must_use]
    pub fn new(hub: impl Into<String>, connection: Connection) -> Self {
        let (socket, info, options) = connection.into_parts();
        let callbacks =
            CallbackRegistry::new(options.max_message_process_duration, options.callback_buffer);

        Self {
            inner: Arc::new(Session {
                hub: hub.into(),
                socket,
                info,
                options,
                invocations: InvocationRegistry::new(),
                callbacks,
                shutdown: CancellationToken::new(),
                closed: AtomicBool::new(false),
                running: AtomicBool::new(false),
            }),
        }
    }

    /// Runs the handshake described by `builder` and wraps the result.
    ///
    /// # Errors
    ///
    /// Returns any configuration or handshake error.
    pub async fn connect(hub: impl Into<String>, builder: ConnectionBuilder) -> Result<Self> {
        let connection = builder.connect().await?;
        Ok(Self::new(hub, connection))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Hub name used for outbound invocations.
    #[inline]
    #[must_use]
    pub fn hub(&self) -> &str {
        &self.inner.hub
    }

    /// Negotiated session metadata.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &SessionInfo {
        &self.inner.info
    }

    /// Options the session was opened with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.inner.options
    }

    /// Returns `true` once the session is closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire) || self.inner.shutdown.is_cancelled()
    }

    /// Number of invocations waiting for a response.
    #[inline]
    #[must_use]
    pub fn pending_invocations(&self) -> usize {
        self.inner.invocations.len()
    }

    /// Number of registered push subscriptions.
    #[inline]
    #[must_use]
    pub fn active_callbacks(&self) -> usize {
        self.inner.callbacks.len()
    }

    // ========================================================================
    // Invocations
    // ========================================================================

    /// Sends a hub method invocation.
    ///
    /// The returned handle resolves once the matching response arrives.
    /// Responses are only routed while [`run`](Self::run) is active.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the session is closed
    /// - [`Error::Json`] if an argument fails to serialize
    /// - Any socket write error
    pub async fn invoke(&self, method: &str, args: impl HubArgs) -> Result<Invocation> {
        self.invoke_with_cancel(&CancellationToken::new(), method, args)
            .await
    }

    /// Sends an invocation whose handle is bound to `cancel`.
    ///
    /// Cancelling `cancel` resolves only this invocation.
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](Self::invoke).
    pub async fn invoke_with_cancel(
        &self,
        cancel: &CancellationToken,
        method: &str,
        args: impl HubArgs,
    ) -> Result<Invocation> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let args = args.into_args()?;
        let invocation = self.inner.invocations.create(cancel.child_token(), method)?;
        let id = invocation.id();

        let message = HubMessage::invocation(&self.inner.hub, method, args, id);
        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(e) => {
                self.inner.invocations.remove(id);
                return Err(e.into());
            }
        };

        if let Err(e) = self.inner.socket.write_text(text).await {
            self.inner.invocations.remove(id);
            return Err(e);
        }

        debug!(%id, method, "Invocation sent");
        Ok(invocation)
    }

    /// Invokes a method and deserializes its result.
    ///
    /// # Errors
    ///
    /// Errors from [`invoke`](Self::invoke) and
    /// [`Invocation::unmarshal`].
    pub async fn call<T: DeserializeOwned>(&self, method: &str, args: impl HubArgs) -> Result<T> {
        self.invoke(method, args).await?.unmarshal().await
    }

    // ========================================================================
    // Callbacks
    // ========================================================================

    /// Subscribes to pushes of `method` for the life of the session.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the session is closed
    /// - [`Error::DuplicateCallback`] if `method` already has a live stream
    pub fn callback(&self, method: &str) -> Result<CallbackStream> {
        self.callback_with_cancel(&self.inner.shutdown, method)
    }

    /// Subscribes to pushes of `method` until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Same as [`callback`](Self::callback).
    pub fn callback_with_cancel(
        &self,
        cancel: &CancellationToken,
        method: &str,
    ) -> Result<CallbackStream> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        self.inner.callbacks.create(cancel, method)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Reads and routes inbound frames until stopped.
    ///
    /// Stops when `cancel` fires, the session is closed, or the socket
    /// fails. In every case pending invocations and live streams resolve as
    /// cancelled and the socket is closed before this returns. The session
    /// is closed afterwards.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyRunning`] if the loop is already running
    /// - The transport or decode error that ended the loop
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        if self.inner.running.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyRunning);
        }

        info!(hub = %self.inner.hub, connection_id = %self.inner.info.connection_id, "Session running");

        let scope = Scope {
            group: cancel.child_token(),
            shutdown: &self.inner.shutdown,
        };
        let result = dispatch::run(
            self.inner.socket.as_ref(),
            &self.inner.invocations,
            &self.inner.callbacks,
            scope,
        )
        .await;

        self.inner.closed.store(true, Ordering::Release);
        self.inner.shutdown.cancel();

        match &result {
            Ok(()) => info!("Session stopped"),
            Err(e) => info!(error = %e, "Session ended with error"),
        }

        result
    }

    /// Closes the session. Idempotent.
    ///
    /// Resolves all pending invocations and live streams as cancelled and
    /// closes the socket.
    ///
    /// # Errors
    ///
    /// Returns the socket's close error, first call only.
    pub async fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        debug!(hub = %self.inner.hub, "Closing session");

        self.inner.shutdown.cancel();
        self.inner.invocations.remove_all();
        self.inner.callbacks.remove_all();
        self.inner.socket.close().await
    }
}

// ============================================================================
// Tests
// ============================================================================
