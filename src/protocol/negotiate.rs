//! Handshake response bodies.
//!
//! Negotiate and start are plain HTTP GETs answered with JSON.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;

// ============================================================================
// Constants
// ============================================================================

/// Acknowledgement the server sends from the start endpoint.
pub const STARTED: &str = "started";

// ============================================================================
// NegotiateResponse
// ============================================================================

/// Body of a successful negotiate request.
///
/// Timing fields are kept as reported and not interpreted.
///
/// # Format
///
/// ```json
/// {
///   "Url": "/signalr",
///   "ConnectionToken": "...",
///   "ConnectionId": "...",
///   "KeepAliveTimeout": 20.0,
///   "DisconnectTimeout": 30.0,
///   "ConnectionTimeout": 110.0,
///   "TryWebSockets": true,
///   "ProtocolVersion": "1.5",
///   "TransportConnectTimeout": 5.0,
///   "LongPollDelay": 0.0
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NegotiateResponse {
    /// Endpoint path to use for every later step.
    pub url: String,
    /// Connection token (raw, unescaped).
    pub connection_token: String,
    /// Connection id.
    pub connection_id: ConnectionId,
    /// Keep-alive timeout in seconds.
    pub keep_alive_timeout: Option<f64>,
    /// Disconnect timeout in seconds.
    pub disconnect_timeout: Option<f64>,
    /// Connection timeout in seconds.
    pub connection_timeout: Option<f64>,
    /// Whether the server allows WebSockets.
    pub try_web_sockets: bool,
    /// Protocol version the server speaks.
    pub protocol_version: String,
    /// Transport connect timeout in seconds.
    pub transport_connect_timeout: Option<f64>,
    /// Long polling delay in seconds.
    pub long_poll_delay: Option<f64>,
}

impl NegotiateResponse {
    /// Parses a negotiate body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Handshake`] if the body is not valid JSON.
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| Error::handshake(format!("malformed negotiate response: {e}")))
    }
}

// ============================================================================
// StartResponse
// ============================================================================

/// Body of the start request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StartResponse {
    /// Should equal [`STARTED`].
    #[serde(rename = "Response", default)]
    pub response: String,
}

impl StartResponse {
    /// Parses a start body and checks the acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Handshake`] if the body is malformed or the
    /// acknowledgement is anything other than `started`.
    pub fn parse(body: &str) -> Result<Self> {
        let parsed: Self = serde_json::from_str(body)
            .map_err(|e| Error::handshake(format!("malformed start response: {e}")))?;

        if parsed.response != STARTED {
            return Err(Error::handshake(format!(
                "start response is not '{STARTED}': {:?}",
                parsed.response
            )));
        }

        Ok(parsed)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_minimal() {
        let parsed = NegotiateResponse::parse(
            r#"{"Url":"/signalr2","ConnectionToken":"tok","ConnectionId":"cid"}"#,
        )
        .expect("parse");
        assert_eq!(parsed.url, "/signalr2");
        assert_eq!(parsed.connection_token, "tok");
        assert_eq!(parsed.connection_id, ConnectionId::new("cid"));
        assert_eq!(parsed.keep_alive_timeout, None);
    }

    #[test]
    fn test_negotiate_full() {
        let parsed = NegotiateResponse::parse(
            r#"{
                "Url": "/signalr",
                "ConnectionToken": "a+b/c",
                "ConnectionId": "0b0c",
                "KeepAliveTimeout": 20.0,
                "DisconnectTimeout": 30.0,
                "ConnectionTimeout": 110.0,
                "TryWebSockets": true,
                "ProtocolVersion": "1.5",
                "TransportConnectTimeout": 5.0,
                "LongPollDelay": 0.0
            }"#,
        )
        .expect("parse");
        assert!(parsed.try_web_sockets);
        assert_eq!(parsed.protocol_version, "1.5");
        assert_eq!(parsed.keep_alive_timeout, Some(20.0));
        assert_eq!(parsed.long_poll_delay, Some(0.0));
    }

    #[test]
    fn test_negotiate_malformed() {
        let err = NegotiateResponse::parse("<html>").unwrap_err();
        assert!(err.is_handshake_error());
    }

    #[test]
    fn test_start_started() {
        let parsed = StartResponse::parse(r#"{"Response":"started"}"#).expect("parse");
        assert_eq!(parsed.response, STARTED);
    }

    #[test]
    fn test_start_other_value() {
        let err = StartResponse::parse(r#"{"Response":"nope"}"#).unwrap_err();
        assert!(err.to_string().contains("nope"));

        assert!(StartResponse::parse("{}").is_err());
    }
}
