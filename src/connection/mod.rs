//! Session establishment.
//!
//! This module turns a host and endpoint into an application-ready
//! [`Connection`] via the negotiate → connect → start handshake.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConnectionBuilder`] | Fluent configuration builder |
//! | [`ConnectionOptions`] | Retry policy and dispatch tuning |
//! | [`Handshake`] | Step-by-step state machine |
//! | [`Endpoint`] | Handshake URL construction |
//! | [`Connection`] | Ready socket plus session metadata |
//!
//! # Example
//!
//! ```no_run
//! use signalr_client::ConnectionBuilder;
//!
//! # async fn example() -> signalr_client::Result<()> {
//! let connection = ConnectionBuilder::new()
//!     .host("socket.example.com")
//!     .connection_data(r#"[{"name":"corehub"}]"#)
//!     .connect()
//!     .await?;
//!
//! println!("connected as {}", connection.session().connection_id);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for the handshake.
pub mod builder;

/// Established connection and session metadata.
pub mod core;

/// Handshake URL construction.
pub mod endpoint;

/// Negotiate/connect/start state machine.
pub mod handshake;

/// Connection tuning options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ConnectionBuilder;
pub use core::{Connection, SessionInfo};
pub use endpoint::{Endpoint, HandshakeCommand, Scheme};
pub use handshake::{Handshake, HandshakeState};
pub use options::ConnectionOptions;
