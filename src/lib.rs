//! SoundBridge - Listen-along playback bridge for a web media player.
//!
//! This library connects a web media player's page contexts to a desktop
//! client over a local WebSocket, in both directions: intercepted playback
//! events flow out as `track-now-playing` messages, and `play-track-request`
//! commands flow in and start playback inside the page.
//!
//! # Architecture
//!
//! Three execution contexts cooperate:
//!
//! - **Page contexts**: Intercept the host's module loader, capture playback
//!   capabilities, run playback commands
//! - **Coordination context**: Owns the socket, fans messages out to pages,
//!   supervises reconnection
//! - **Desktop endpoint**: A WebSocket server on `ws://127.0.0.1:9005`
//!
//! Key design principles:
//!
//! - Capabilities are discovered by a fixed [`Matcher`] set evaluated
//!   against every module registration, never by static linkage
//! - The loader wrap is transparent: arguments, receivers, and return
//!   values pass through unchanged
//! - Every capability is write-once; the first capture wins
//! - All delivery is best-effort with no buffering and no retry queues;
//!   reconnection is a periodic consumer-gated probe
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use soundbridge::{
//!     BridgeConfig, CapabilityRegistry, LoaderSlot, MessageRelay, ModuleInterceptor,
//!     ModuleScanner, PlaybackEventBridge, ReconnectionSupervisor, SocketChannel, VecSink,
//! };
//!
//! # fn page_directory() -> Arc<dyn soundbridge::PageDirectory> { unimplemented!() }
//! # fn emit() -> soundbridge::EmitFn { unimplemented!() }
//! #[tokio::main]
//! async fn main() {
//!     let config = BridgeConfig::default();
//!
//!     // Coordination context: socket plus supervised reconnection.
//!     let channel = SocketChannel::new(&config);
//!     let pages = page_directory();
//!     let relay = Arc::new(MessageRelay::new(pages.clone(), Arc::new(channel.clone())));
//!     relay.attach(&channel);
//!     ReconnectionSupervisor::new(&config, channel, pages).spawn();
//!
//!     // Page context: arm the loader slot before the host loads.
//!     let registry = CapabilityRegistry::new();
//!     let bridge = Arc::new(PlaybackEventBridge::new());
//!     let scanner = ModuleScanner::new(registry, bridge, emit());
//!     let interceptor = ModuleInterceptor::new(scanner, VecSink::new());
//!     let slot = LoaderSlot::install(interceptor);
//!     let _loader = slot.get();
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`capability`] | Capability discovery: registry, matchers, interceptor |
//! | [`config`] | Bridge configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`host`] | Host object model and module loader seam |
//! | [`playback`] | Playback events, commands, and track metadata |
//! | [`protocol`] | Wire message types |
//! | [`relay`] | Cross-context message relay |
//! | [`socket`] | Socket channel and reconnection supervision |

// ============================================================================
// Modules
// ============================================================================

/// Capability discovery.
///
/// The write-once [`CapabilityRegistry`], the fixed matcher set evaluated
/// against every module registration, and the loader interceptor.
pub mod capability;

/// Bridge configuration.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Host object model.
///
/// Dynamic objects with fallible method and constructor slots, and the
/// module registration seam the interceptor wraps.
pub mod host;

/// Playback events and commands.
pub mod playback;

/// Wire message types.
///
/// The two-message protocol spoken with the desktop endpoint.
pub mod protocol;

/// Cross-context message relay.
///
/// Provenance-tagged envelopes, page fan-out, and loop prevention.
pub mod relay;

/// Socket transport.
///
/// Connection state machine, WebSocket channel, reconnection supervisor.
pub mod socket;

// ============================================================================
// Re-exports
// ============================================================================

// Capability types
pub use capability::{
    Capability, CapabilityRef, CapabilityRegistry, EmitFn, LoaderSlot, Matcher, ModuleInterceptor,
    ModuleScanner, default_matchers,
};

// Configuration
pub use config::BridgeConfig;

// Error types
pub use error::{Error, Result};

// Host model types
pub use host::{HostCtor, HostMethod, HostObject, HostValue, ModuleRecord, RegistrationSink, VecSink};

// Playback types
pub use playback::{
    Clock, HostTrack, NowPlayingSource, PlaybackCommander, PlaybackEventBridge, PlaybackSnapshot,
    TrackMetadataFetcher, extract_sound_data,
};

// Protocol types
pub use protocol::{Message, NowPlaying, PlayRequest};

// Relay types
pub use relay::{
    MessageRelay, OutboundSink, PageBridge, PageDirectory, PageEndpoint, Provenance, RelayEnvelope,
};

// Socket types
pub use socket::{ConnectionState, MessageHandler, ReconnectionSupervisor, SocketChannel};
