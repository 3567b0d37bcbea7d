//! Bridge configuration options.
//!
//! Provides a type-safe interface for configuring the bridge: the desktop
//! endpoint port, the reconnection probe period, and the URL pattern that
//! identifies consumer pages.
//!
//! # Example
//!
//! ```
//! use soundbridge::BridgeConfig;
//!
//! let config = BridgeConfig::new()
//!     .with_port(9100)
//!     .with_probe_period_ms(5_000);
//!
//! assert_eq!(config.endpoint_url(), "ws://127.0.0.1:9100");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default desktop endpoint port.
pub const DEFAULT_PORT: u16 = 9005;

/// Default reconnection probe period (2.5s).
pub const DEFAULT_PROBE_PERIOD: Duration = Duration::from_millis(2_500);

/// Default URL pattern identifying consumer pages.
pub const DEFAULT_CONSUMER_PATTERN: &str = "*://*.soundcloud.com/*";

// ============================================================================
// BridgeConfig
// ============================================================================

/// Bridge configuration.
///
/// Controls the outbound socket endpoint, the self-healing probe period,
/// and which pages count as consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Port of the desktop endpoint on `127.0.0.1`.
    pub port: u16,

    /// Period of the reconnection probe.
    pub probe_period: Duration,

    /// URL pattern a page must match to count as a consumer.
    pub consumer_pattern: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl BridgeConfig {
    /// Creates a new configuration with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            probe_period: DEFAULT_PROBE_PERIOD,
            consumer_pattern: DEFAULT_CONSUMER_PATTERN.to_string(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BridgeConfig {
    /// Sets the desktop endpoint port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the reconnection probe period in milliseconds.
    #[inline]
    #[must_use]
    pub fn with_probe_period_ms(mut self, millis: u64) -> Self {
        self.probe_period = Duration::from_millis(millis);
        self
    }

    /// Sets the consumer page URL pattern.
    #[inline]
    #[must_use]
    pub fn with_consumer_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.consumer_pattern = pattern.into();
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl BridgeConfig {
    /// Returns the WebSocket URL of the desktop endpoint.
    ///
    /// Format: `ws://127.0.0.1:{port}`
    #[inline]
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::new();
        assert_eq!(config.port, 9005);
        assert_eq!(config.probe_period, Duration::from_millis(2_500));
        assert_eq!(config.consumer_pattern, DEFAULT_CONSUMER_PATTERN);
    }

    #[test]
    fn test_endpoint_url() {
        let config = BridgeConfig::new().with_port(9100);
        assert_eq!(config.endpoint_url(), "ws://127.0.0.1:9100");
    }

    #[test]
    fn test_builder_chain() {
        let config = BridgeConfig::new()
            .with_port(1234)
            .with_probe_period_ms(100)
            .with_consumer_pattern("*://example.com/*");

        assert_eq!(config.port, 1234);
        assert_eq!(config.probe_period, Duration::from_millis(100));
        assert_eq!(config.consumer_pattern, "*://example.com/*");
    }
}
