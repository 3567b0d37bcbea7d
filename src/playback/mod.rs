//! Playback state and commands.
//!
//! The outbound half turns intercepted playback state into wire messages;
//! the inbound half executes playback commands from the desktop peer against
//! captured capabilities.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | Snapshot timestamps for `track-now-playing` events |
//! | [`track`] | Currently-playing item sources |
//! | [`command`] | Commanded playback and the queue surface |
//! | [`hydration`] | Track-page hydration payload parsing |

// ============================================================================
// Submodules
// ============================================================================

/// Playback event bridge.
pub mod bridge;

/// Currently-playing item sources.
pub mod track;

/// Externally commanded playback.
pub mod command;

/// Track-page hydration payload parsing.
pub mod hydration;

// ============================================================================
// Re-exports
// ============================================================================

pub use bridge::{Clock, PlaybackEventBridge, PlaybackSnapshot};
pub use command::{PlaybackCommander, TrackMetadataFetcher};
pub use hydration::extract_sound_data;
pub use track::{HostTrack, NowPlayingSource};
