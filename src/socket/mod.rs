//! Socket transport toward the desktop endpoint.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`channel`] | Connection state machine and the WebSocket channel |
//! | [`supervisor`] | Consumer-gated periodic reconnection |

// ============================================================================
// Submodules
// ============================================================================

/// Connection state machine and socket channel.
pub mod channel;

/// Periodic reconnection supervision.
pub mod supervisor;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{ConnectionState, MessageHandler, SocketChannel};
pub use supervisor::ReconnectionSupervisor;
