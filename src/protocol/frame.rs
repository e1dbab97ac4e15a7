//! Inbound persistent-connection frames.
//!
//! Every text message the server pushes over the socket decodes into a
//! [`Frame`]. One shape covers four roles:
//!
//! | Role | Marker |
//! |------|--------|
//! | Keep-alive | the literal `{}` |
//! | Initialization | `S` set to [`INITIALIZED`] |
//! | Invocation response | `I` set, with `Result` or `Error` |
//! | Push batch | `M` carries zero or more [`HubMessage`]s |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::InvocationId;

use super::HubMessage;

// ============================================================================
// Constants
// ============================================================================

/// Keep-alive frame body.
pub const KEEP_ALIVE: &str = "{}";

/// Value of `S` in the initialization frame.
pub const INITIALIZED: i64 = 1;

// ============================================================================
// Frame
// ============================================================================

/// A decoded server message.
///
/// # Format
///
/// ```json
/// {
///   "C": "d-F2577E41-B,0|If60z,0|If600,1",
///   "M": [{ "H": "corehub", "M": "updateSummaryState", "A": [{ ... }] }],
///   "S": 1,
///   "G": "groups-token",
///   "I": "1",
///   "Result": { ... },
///   "Error": "..."
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Frame {
    /// Message id, present on all non keep-alive persistent messages.
    #[serde(rename = "C", default)]
    pub message_id: Option<String>,

    /// Push sub-messages, in server order.
    #[serde(rename = "M", default, deserialize_with = "null_as_empty")]
    pub messages: Vec<HubMessage>,

    /// Initialization flag.
    #[serde(rename = "S", default)]
    pub init: Option<i64>,

    /// Groups token (opaque).
    #[serde(rename = "G", default)]
    pub groups_token: Option<String>,

    /// Correlation id of the invocation this frame answers.
    #[serde(rename = "I", default)]
    pub invocation_id: Option<InvocationId>,

    /// Invocation result payload.
    #[serde(rename = "Result", alias = "R", default)]
    pub result: Option<Value>,

    /// Invocation error text.
    #[serde(rename = "Error", alias = "E", default)]
    pub error: Option<String>,
}

impl Frame {
    /// Parses a text message into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the text is not a JSON frame object.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::protocol(format!("malformed frame: {e}")))
    }

    /// Parses a binary message as a UTF-8 JSON frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the payload is not a JSON frame object.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::protocol(format!("malformed binary frame: {e}")))
    }

    /// Returns `true` if the raw text is a keep-alive.
    ///
    /// Checked before decoding so keep-alives cost nothing.
    #[inline]
    #[must_use]
    pub fn is_keep_alive(text: &str) -> bool {
        text.trim() == KEEP_ALIVE
    }

    /// Returns `true` if this is the initialization frame.
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.init == Some(INITIALIZED)
    }

    /// Returns `true` if this frame answers an invocation.
    #[inline]
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.invocation_id.is_some()
    }

    /// Returns the server error text, if any.
    ///
    /// An empty error string is treated as no error.
    #[inline]
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// Accepts `null` where a list is expected.
pub(super) fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keep_alive_detection() {
        assert!(Frame::is_keep_alive("{}"));
        assert!(Frame::is_keep_alive(" {} \n"));
        assert!(!Frame::is_keep_alive(r#"{"S":1}"#));
    }

    #[test]
    fn test_keep_alive_decodes_to_empty_frame() {
        let frame = Frame::parse("{}").expect("parse");
        assert_eq!(frame, Frame::default());
        assert!(!frame.is_initialized());
        assert!(!frame.is_response());
    }

    #[test]
    fn test_init_frame() {
        let frame = Frame::parse(r#"{"C":"s-0,2CDDE7A|1,23ADE88|2,297B01B|3,3997404|4,33239B5","S":1,"M":[]}"#)
            .expect("parse");
        assert!(frame.is_initialized());
        assert!(frame.messages.is_empty());
        assert!(frame.message_id.is_some());
    }

    #[test]
    fn test_init_frame_wrong_sentinel() {
        let frame = Frame::parse(r#"{"S":0}"#).expect("parse");
        assert!(!frame.is_initialized());
    }

    #[test]
    fn test_response_frame_with_result() {
        let frame = Frame::parse(r#"{"I":1,"Result":{"x":1}}"#).expect("parse");
        assert_eq!(frame.invocation_id, Some(InvocationId::new(1)));
        assert_eq!(frame.result, Some(json!({"x": 1})));
        assert_eq!(frame.error_message(), None);
    }

    #[test]
    fn test_response_frame_short_field_names() {
        let frame = Frame::parse(r#"{"I":"4","R":true}"#).expect("parse");
        assert_eq!(frame.invocation_id, Some(InvocationId::new(4)));
        assert_eq!(frame.result, Some(json!(true)));

        let frame = Frame::parse(r#"{"I":"5","E":"boom"}"#).expect("parse");
        assert_eq!(frame.error_message(), Some("boom"));
    }

    #[test]
    fn test_empty_error_is_success() {
        let frame = Frame::parse(r#"{"I":2,"Error":""}"#).expect("parse");
        assert_eq!(frame.error_message(), None);
    }

    #[test]
    fn test_push_batch() {
        let frame = Frame::parse(
            r#"{"C":"d-1","M":[{"H":"CoreHub","M":"tick","A":[1,"a"]},{"H":"CoreHub","M":"tock","A":[]}]}"#,
        )
        .expect("parse");
        assert_eq!(frame.messages.len(), 2);
        assert_eq!(frame.messages[0].method, "tick");
        assert_eq!(frame.messages[0].args, vec![json!(1), json!("a")]);
        assert_eq!(frame.messages[1].method, "tock");
        assert!(!frame.is_response());
    }

    #[test]
    fn test_null_messages() {
        let frame = Frame::parse(r#"{"C":"d-1","M":null}"#).expect("parse");
        assert!(frame.messages.is_empty());
    }

    #[test]
    fn test_malformed_frame() {
        let err = Frame::parse("not json").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));

        let err = Frame::parse("[1,2]").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_parse_bytes() {
        let frame = Frame::parse_bytes(br#"{"S":1}"#).expect("parse");
        assert!(frame.is_initialized());
    }
}
