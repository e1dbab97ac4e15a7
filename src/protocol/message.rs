//! Hub method messages.
//!
//! The same `{H, M, A, I}` shape travels both ways: outbound it is an
//! invocation, inbound (inside a frame's `M` array) it is a push
//! sub-message.

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::InvocationId;

// ============================================================================
// HubMessage
// ============================================================================

/// A hub method call.
///
/// # Format
///
/// ```json
/// {
///   "H": "corehub",
///   "M": "SubscribeToExchangeDeltas",
///   "A": ["BTC-ETH"],
///   "I": 1
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubMessage {
    /// Hub name. Omitted on the wire when empty.
    #[serde(rename = "H", default, skip_serializing_if = "String::is_empty")]
    pub hub: String,

    /// Method name. Empty when the server omits it.
    #[serde(rename = "M", default)]
    pub method: String,

    /// Positional arguments, each serialized independently. `null` reads
    /// as no arguments.
    #[serde(rename = "A", default, deserialize_with = "super::frame::null_as_empty")]
    pub args: Vec<Value>,

    /// Correlation id (outbound invocations only).
    #[serde(rename = "I", default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<InvocationId>,
}

impl HubMessage {
    /// Creates an outbound invocation message.
    #[inline]
    #[must_use]
    pub fn invocation(
        hub: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
        id: InvocationId,
    ) -> Self {
        Self {
            hub: hub.into(),
            method: method.into(),
            args,
            invocation_id: Some(id),
        }
    }

    /// Deserializes the positional arguments into `T`.
    ///
    /// `T` is usually a tuple with one element per argument, so an arity
    /// mismatch is an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the arguments do not match `T`.
    pub fn args<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Array(self.args.clone())).map_err(|e| {
            Error::protocol(format!(
                "failed to unmarshal arguments of '{}': {e}",
                self.method
            ))
        })
    }
}

// ============================================================================
// HubArgs
// ============================================================================

/// Positional arguments for an invocation.
///
/// Implemented for `()`, `Vec<Value>` and tuples of up to six
/// [`Serialize`] values.
///
/// ```ignore
/// client.invoke("Subscribe", ("BTC-ETH", 5)).await?;
/// ```
pub trait HubArgs {
    /// Serializes each argument on its own.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if any argument fails to serialize.
    fn into_args(self) -> Result<Vec<Value>>;
}

impl HubArgs for () {
    fn into_args(self) -> Result<Vec<Value>> {
        Ok(Vec::new())
    }
}

impl HubArgs for Vec<Value> {
    fn into_args(self) -> Result<Vec<Value>> {
        Ok(self)
    }
}

macro_rules! impl_hub_args {
    ($($name:ident),+) => {
        impl<$($name: Serialize),+> HubArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_args(self) -> Result<Vec<Value>> {
                let ($($name,)+) = self;
                Ok(vec![$(serde_json::to_value($name)?),+])
            }
        }
    };
}

impl_hub_args!(A);
impl_hub_args!(A, B);
impl_hub_args!(A, B, C);
impl_hub_args!(A, B, C, D);
impl_hub_args!(A, B, C, D, E);
impl_hub_args!(A, B, C, D, E, F);

// ============================================================================
// Tests
// ============================================================================
