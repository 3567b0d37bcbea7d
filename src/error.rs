//! Error types for the soundbridge crate.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use soundbridge::{Result, Error};
//!
//! fn example(registry: &CapabilityRegistry) -> Result<HostValue> {
//!     let queue = registry
//!         .get(Capability::ReadQueue)
//!         .ok_or_else(|| Error::missing_capability(Capability::ReadQueue))?;
//!     queue.invoke(&[])
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | Host | [`Error::HostCall`], [`Error::NotConstructible`] |
//! | Capability | [`Error::MissingCapability`] |
//! | Command | [`Error::Metadata`], [`Error::InvalidTrackUrl`] |
//! | External | [`Error::Json`], [`Error::WebSocket`] |
//!
//! Note that most failures in this system are deliberately *not* errors:
//! malformed inbound payloads are logged and dropped, unmatched module shapes
//! simply do not fire a matcher, and the fire-and-forget play command swallows
//! everything its fallible form reports. The variants here exist for the seams
//! where a caller can still make a decision.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::capability::Capability;

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
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when the outbound connection cannot be established.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// WebSocket connection closed unexpectedly.
    ///
    /// Returned when the connection is lost during operation.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Host Errors
    // ========================================================================
    /// A call into a captured host function failed.
    ///
    /// Raised by host methods themselves; the interceptor and command path
    /// contain these locally and never let them escape an event callback.
    #[error("Host call failed: {message}")]
    HostCall {
        /// Description of the host-side failure.
        message: String,
    },

    /// A captured reference was invoked as a constructor but is not one.
    #[error("Capability {capability} is not a constructor")]
    NotConstructible {
        /// The capability that was invoked.
        capability: Capability,
    },

    // ========================================================================
    // Capability Errors
    // ========================================================================
    /// A requested capability was never captured.
    ///
    /// The matching host module has not loaded, or its shape changed. Public
    /// operations degrade to silent no-ops on this; the variant exists for
    /// callers that want to observe the degradation.
    #[error("Capability not captured: {capability}")]
    MissingCapability {
        /// The capability that is absent from the registry.
        capability: Capability,
    },

    // ========================================================================
    // Command Errors
    // ========================================================================
    /// Track metadata could not be fetched or parsed.
    #[error("Metadata error: {message}")]
    Metadata {
        /// Description of the metadata failure.
        message: String,
    },

    /// A play request carried a URL that does not parse.
    #[error("Invalid track URL: {url}")]
    InvalidTrackUrl {
        /// The rejected URL.
        url: String,
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
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a host call error.
    #[inline]
    pub fn host_call(message: impl Into<String>) -> Self {
        Self::HostCall {
            message: message.into(),
        }
    }

    /// Creates a not-constructible error.
    #[inline]
    pub fn not_constructible(capability: Capability) -> Self {
        Self::NotConstructible { capability }
    }

    /// Creates a missing capability error.
    #[inline]
    pub fn missing_capability(capability: Capability) -> Self {
        Self::MissingCapability { capability }
    }

    /// Creates a metadata error.
    #[inline]
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata {
            message: message.into(),
        }
    }

    /// Creates an invalid track URL error.
    #[inline]
    pub fn invalid_track_url(url: impl Into<String>) -> Self {
        Self::InvalidTrackUrl { url: url.into() }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a missing-capability degradation.
    #[inline]
    #[must_use]
    pub fn is_missing_capability(&self) -> bool {
        matches!(self, Self::MissingCapability { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry: connections are re-attempted
    /// by the supervisor, and missing capabilities appear as modules load.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.is_connection_error() || self.is_missing_capability()
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
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_missing_capability_display() {
        let err = Error::missing_capability(Capability::BeginPlayback);
        assert_eq!(err.to_string(), "Capability not captured: begin-playback");
    }

    #[test]
    fn test_is_connection_error() {
        let conn_err = Error::connection("test");
        let closed_err = Error::ConnectionClosed;
        let other_err = Error::metadata("test");

        assert!(conn_err.is_connection_error());
        assert!(closed_err.is_connection_error());
        assert!(!other_err.is_connection_error());
    }

    #[test]
    fn test_is_recoverable() {
        let missing = Error::missing_capability(Capability::ReadQueue);
        let invalid = Error::invalid_track_url("not a url");

        assert!(missing.is_recoverable());
        assert!(!invalid.is_recoverable());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
