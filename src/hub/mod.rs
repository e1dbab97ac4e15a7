//! Hub session: invocations, push subscriptions and the dispatch loop.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Session owner: invoke, subscribe, run, close |
//! | [`Invocation`] | Handle to one pending call |
//! | [`CallbackStream`] | Push messages for one method |
//!
//! # Data Flow
//!
//! ```text
//! Socket ──► reader ──(1 slot)──► router ──┬──► invocation registry ──► Invocation
//!                                          └──► callback registry   ──► CallbackStream
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Push subscription registry and streams.
pub mod callbacks;

/// Session owner.
pub mod client;

/// Reader/router loop.
mod dispatch;

/// Pending invocation registry and handles.
pub mod invocations;

// ============================================================================
// Re-exports
// ============================================================================

pub use callbacks::CallbackStream;
pub use client::Client;
pub use invocations::Invocation;
