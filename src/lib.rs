//! SignalR client - persistent-connection hub client over WebSocket.
//!
//! This library establishes a SignalR session through the classic
//! negotiate → connect → start handshake and then multiplexes hub method
//! invocations and server-pushed messages over the single socket.
//!
//! # Architecture
//!
//! The client follows a reader/router model:
//!
//! - **Handshake**: HTTP negotiate (with fixed-interval retry), WebSocket
//!   upgrade, HTTP start, then the `{"S":1}` initialization frame
//! - **Reader**: reads frames one at a time and hands them to the router
//! - **Router**: resolves pending invocations and feeds push subscribers
//!
//! Key design principles:
//!
//! - A [`Client`] owns the socket and both registries, and is cheap to clone
//! - Every blocking operation is bound to a `CancellationToken`
//! - A subscriber that stops draining is closed instead of stalling the
//!   session
//!
//! # Quick Start
//!
//! ```no_run
//! use signalr_client::{Client, ConnectionBuilder, Result};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::connect(
//!         "corehub",
//!         ConnectionBuilder::new()
//!             .host("socket.example.com")
//!             .connection_data(r#"[{"name":"corehub"}]"#),
//!     )
//!     .await?;
//!
//!     let cancel = CancellationToken::new();
//!     let runner = {
//!         let client = client.clone();
//!         let cancel = cancel.clone();
//!         tokio::spawn(async move { client.run(cancel).await })
//!     };
//!
//!     let mut updates = client.callback("updateSummaryState")?;
//!     let first = updates.read().await?;
//!     println!("{:?}", first.args);
//!
//!     cancel.cancel();
//!     let _ = runner.await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connection`] | Builder, options and handshake state machine |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`hub`] | [`Client`], [`Invocation`], [`CallbackStream`] |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire message types |
//! | [`transport`] | Socket and HTTP abstractions |

// ============================================================================
// Modules
// ============================================================================

/// Session establishment.
///
/// Use [`ConnectionBuilder`] to configure and run the handshake.
pub mod connection;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Hub session: invocations, push streams and the dispatch loop.
pub mod hub;

/// Type-safe identifiers.
///
/// Newtype wrappers keep invocation and connection ids apart.
pub mod identifiers;

/// Wire protocol message types.
pub mod protocol;

/// Transport layer.
///
/// Socket, dialer and HTTP client traits with real and in-process
/// implementations.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Connection types
pub use connection::{
    Connection, ConnectionBuilder, ConnectionOptions, Handshake, HandshakeState, Scheme,
    SessionInfo,
};

// Error types
pub use error::{Error, Result};

// Hub types
pub use hub::{CallbackStream, Client, Invocation};

// Identifier types
pub use identifiers::{ConnectionId, InvocationId};

// Protocol types
pub use protocol::{Frame, HubArgs, HubMessage};
