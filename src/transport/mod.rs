//! Transport layer.
//!
//! The handshake and the hub client depend only on the traits defined
//! here. Concrete implementations are provided for real networks and for
//! in-process use.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐      HTTP GET         ┌─────────────────┐
//! │  Handshake      │──────────────────────►│                 │
//! │  (HttpClient)   │  negotiate / start    │  SignalR        │
//! │                 │                       │  Server         │
//! │  Client         │      WebSocket        │                 │
//! │  (Socket)       │◄─────────────────────►│                 │
//! └─────────────────┘      /connect         └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `socket` | `Socket` and `Dialer` traits |
//! | `http` | `HttpClient` trait and reqwest implementation |
//! | `websocket` | tokio-tungstenite socket and dialer |
//! | `memory` | In-process socket pair |

// ============================================================================
// Submodules
// ============================================================================

/// HTTP request/response primitive.
pub mod http;

/// In-process socket pair.
pub mod memory;

/// Duplex socket abstraction.
pub mod socket;

/// WebSocket implementation.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use memory::{MemoryPeer, MemorySocket};
pub use socket::{Dialer, Socket, SocketMessage};
pub use websocket::{WebSocket, WebSocketDialer};
