//! Connection tuning options.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use signalr_client::ConnectionOptions;
//!
//! let options = ConnectionOptions::new()
//!     .with_protocol_version("1.5")
//!     .with_negotiate_retry(3, Duration::from_secs(10))
//!     .with_max_message_process_duration(Duration::from_secs(2));
//!
//! options.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Protocol version sent as `clientProtocol`.
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.5";

/// Negotiate attempts before giving up.
pub const DEFAULT_NEGOTIATE_ATTEMPTS: u32 = 5;

/// Pause between failed negotiate attempts.
pub const DEFAULT_NEGOTIATE_RETRY_INTERVAL: Duration = Duration::from_secs(60);

/// How long a push may wait for room in a subscriber's buffer.
pub const DEFAULT_MAX_MESSAGE_PROCESS_DURATION: Duration = Duration::from_secs(5);

/// Buffered push messages per callback stream.
pub const DEFAULT_CALLBACK_BUFFER: usize = 16;

// ============================================================================
// ConnectionOptions
// ============================================================================

/// Handshake and dispatch tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Value of the `clientProtocol` query parameter.
    pub protocol_version: String,

    /// Total negotiate attempts, including the first.
    pub negotiate_attempts: u32,

    /// Fixed pause after each failed negotiate attempt.
    pub negotiate_retry_interval: Duration,

    /// Deadline for delivering one push message to a subscriber.
    ///
    /// A subscriber that misses it is torn down.
    pub max_message_process_duration: Duration,

    /// Capacity of each callback stream buffer.
    pub callback_buffer: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ConnectionOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            negotiate_attempts: DEFAULT_NEGOTIATE_ATTEMPTS,
            negotiate_retry_interval: DEFAULT_NEGOTIATE_RETRY_INTERVAL,
            max_message_process_duration: DEFAULT_MAX_MESSAGE_PROCESS_DURATION,
            callback_buffer: DEFAULT_CALLBACK_BUFFER,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectionOptions {
    /// Sets the client protocol version.
    #[inline]
    #[must_use]
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Sets the negotiate retry policy.
    #[inline]
    #[must_use]
    pub fn with_negotiate_retry(mut self, attempts: u32, interval: Duration) -> Self {
        self.negotiate_attempts = attempts;
        self.negotiate_retry_interval = interval;
        self
    }

    /// Sets the per-message delivery deadline for callbacks.
    #[inline]
    #[must_use]
    pub fn with_max_message_process_duration(mut self, duration: Duration) -> Self {
        self.max_message_process_duration = duration;
        self
    }

    /// Sets the callback stream buffer capacity.
    #[inline]
    #[must_use]
    pub fn with_callback_buffer(mut self, capacity: usize) -> Self {
        self.callback_buffer = capacity;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ConnectionOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.protocol_version.trim().is_empty() {
            return Err(Error::config("protocol version must not be empty"));
        }

        if self.negotiate_attempts == 0 {
            return Err(Error::config("negotiate attempts must be at least 1"));
        }

        if self.max_message_process_duration.is_zero() {
            return Err(Error::config(
                "max message process duration must be greater than zero",
            ));
        }

        if self.callback_buffer == 0 {
            return Err(Error::config("callback buffer must hold at least one message"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
