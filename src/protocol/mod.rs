//! Wire protocol message types.
//!
//! This module defines the JSON shapes exchanged with a SignalR server.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `NegotiateResponse` | HTTP | Token, id and endpoint for the session |
//! | `StartResponse` | HTTP | `started` acknowledgement |
//! | `HubMessage` | Local → Remote | Hub method invocation |
//! | `Frame` | Remote → Local | Response, push batch, init or keep-alive |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `frame` | Inbound frame and sentinels |
//! | `message` | Hub method message and argument encoding |
//! | `negotiate` | Handshake response bodies |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound frame types.
pub mod frame;

/// Hub method messages.
pub mod message;

/// Handshake response bodies.
pub mod negotiate;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::{Frame, INITIALIZED, KEEP_ALIVE};
pub use message::{HubArgs, HubMessage};
pub use negotiate::{NegotiateResponse, STARTED, StartResponse};
