//! Error types for the SignalR client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use signalr_client::{Client, Result};
//!
//! async fn example(client: &Client) -> Result<()> {
//!     let total: u64 = client.invoke("Sum", (1, 2)).await?.unmarshal().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Handshake | [`Error::Http`], [`Error::NegotiateUnavailable`], [`Error::NegotiateExhausted`], [`Error::HandshakeRejected`], [`Error::Handshake`], [`Error::InvalidState`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::AlreadyRunning`] |
//! | Protocol | [`Error::Protocol`] |
//! | Invocation | [`Error::Invocation`], [`Error::Cancelled`] |
//! | Callback | [`Error::DuplicateCallback`], [`Error::CallbackStalled`] |
//! | External | [`Error::Json`], [`Error::WebSocket`], [`Error::Url`], [`Error::HttpClient`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::InvocationId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when builder or options validation fails.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Handshake Errors
    // ========================================================================
    /// HTTP step of the handshake could not be performed.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Description of the transport failure.
        message: String,
    },

    /// Server reported the service as unavailable during negotiate.
    ///
    /// Never retried.
    #[error("Negotiate aborted: service unavailable (status {status})")]
    NegotiateUnavailable {
        /// HTTP status returned by the server.
        status: u16,
    },

    /// Negotiate kept failing until every attempt was used.
    #[error("Negotiate failed after {attempts} attempts (last status {status})")]
    NegotiateExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Status of the last attempt.
        status: u16,
    },

    /// The server refused the WebSocket upgrade.
    #[error("WebSocket upgrade rejected (status {status}): {body}")]
    HandshakeRejected {
        /// HTTP status of the rejected upgrade.
        status: u16,
        /// Rejection body sent by the server.
        body: String,
    },

    /// Unexpected value during the start step.
    ///
    /// Covers a bad `Response` acknowledgement and a malformed or
    /// wrong-typed initialization frame.
    #[error("Handshake failed: {message}")]
    Handshake {
        /// Description of the handshake violation.
        message: String,
    },

    /// Handshake step called out of order.
    #[error("Invalid handshake state: cannot {operation} while {state}")]
    InvalidState {
        /// Step that was attempted.
        operation: &'static str,
        /// State the handshake was in.
        state: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport-level failure on an established connection.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection closed, locally or by the remote end.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The dispatch loop was started while another one is running.
    #[error("Session dispatch loop is already running")]
    AlreadyRunning,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Frame could not be decoded or violates the wire format.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Invocation Errors
    // ========================================================================
    /// Server answered an invocation with an error.
    #[error("Invocation {id} of '{method}' failed: {message}")]
    Invocation {
        /// Hub method that was invoked.
        method: String,
        /// Correlation id of the invocation.
        id: InvocationId,
        /// Error text reported by the server.
        message: String,
    },

    /// The caller's scope was cancelled or the session shut down.
    #[error("Operation cancelled")]
    Cancelled,

    // ========================================================================
    // Callback Errors
    // ========================================================================
    /// A live callback stream already exists for the method.
    #[error("Callback for '{method}' is already registered")]
    DuplicateCallback {
        /// Hub method name.
        method: String,
    },

    /// Callback stream torn down because its consumer stopped draining.
    #[error("Callback for '{method}' stalled for more than {timeout_ms}ms")]
    CallbackStalled {
        /// Hub method name.
        method: String,
        /// Delivery deadline that was exceeded.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP client error.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an HTTP transport error.
    #[inline]
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    /// Creates a handshake error.
    #[inline]
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
        }
    }

    /// Creates a rejected upgrade error.
    #[inline]
    pub fn handshake_rejected(status: u16, body: impl Into<String>) -> Self {
        Self::HandshakeRejected {
            status,
            body: body.into(),
        }
    }

    /// Creates an invalid handshake state error.
    #[inline]
    pub fn invalid_state(operation: &'static str, state: impl ToString) -> Self {
        Self::InvalidState {
            operation,
            state: state.to_string(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an invocation error.
    #[inline]
    pub fn invocation(
        method: impl Into<String>,
        id: InvocationId,
        message: impl Into<String>,
    ) -> Self {
        Self::Invocation {
            method: method.into(),
            id,
            message: message.into(),
        }
    }

    /// Creates a duplicate callback error.
    #[inline]
    pub fn duplicate_callback(method: impl Into<String>) -> Self {
        Self::DuplicateCallback {
            method: method.into(),
        }
    }

    /// Creates a stalled callback error.
    #[inline]
    pub fn callback_stalled(method: impl Into<String>, timeout_ms: u64) -> Self {
        Self::CallbackStalled {
            method: method.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error means the operation was cancelled.
    ///
    /// A stalled callback counts as cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::CallbackStalled { .. })
    }

    /// Returns `true` if this error ended a handshake.
    #[inline]
    #[must_use]
    pub fn is_handshake_error(&self) -> bool {
        matches!(
            self,
            Self::Http { .. }
                | Self::NegotiateUnavailable { .. }
                | Self::NegotiateExhausted { .. }
                | Self::HandshakeRejected { .. }
                | Self::Handshake { .. }
                | Self::InvalidState { .. }
                | Self::HttpClient(_)
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors affect a single invocation or stream and leave the
    /// session usable.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Invocation { .. }
                | Self::Cancelled
                | Self::DuplicateCallback { .. }
                | Self::CallbackStalled { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection("reset by peer");
        assert_eq!(err.to_string(), "Connection failed: reset by peer");
    }

    #[test]
    fn test_invocation_error_names_method_and_id() {
        let err = Error::invocation("Foo", InvocationId::new(7), "bad");
        assert_eq!(err.to_string(), "Invocation 7 of 'Foo' failed: bad");
    }

    #[test]
    fn test_is_cancellation() {
        assert!(Error::Cancelled.is_cancellation());
        assert!(Error::callback_stalled("tick", 100).is_cancellation());
        assert!(!Error::ConnectionClosed.is_cancellation());
    }

    #[test]
    fn test_is_handshake_error() {
        assert!(Error::handshake("bad init").is_handshake_error());
        assert!(Error::NegotiateUnavailable { status: 503 }.is_handshake_error());
        assert!(
            Error::NegotiateExhausted {
                attempts: 5,
                status: 500
            }
            .is_handshake_error()
        );
        assert!(!Error::Cancelled.is_handshake_error());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::duplicate_callback("tick").is_recoverable());
        assert!(Error::invocation("Foo", InvocationId::new(1), "x").is_recoverable());
        assert!(!Error::ConnectionClosed.is_recoverable());
    }

    #[test]
    fn test_invalid_state_display() {
        let err = Error::invalid_state("start", "Idle");
        assert_eq!(
            err.to_string(),
            "Invalid handshake state: cannot start while Idle"
        );
    }

    #[test]
    fn test_already_running_display() {
        let err = Error::AlreadyRunning;
        assert_eq!(err.to_string(), "Session dispatch loop is already running");
        assert!(!err.is_handshake_error());
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
