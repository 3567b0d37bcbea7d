//! Playback event bridge.
//!
//! Builds wire messages from intercepted playback state. At the instant a
//! track begins playing, the bridge reads the item's position and duration
//! and derives absolute Unix-millisecond start and end timestamps:
//!
//! ```text
//! start = now - position
//! end   = now + (duration - position)
//! ```
//!
//! A failing position reader is expected and benign (it happens while the
//! host transitions between tracks) and is treated as position zero, not
//! logged as an error. Positions outside `[0, duration]` are passed through
//! uncorrected; correction policy belongs to the consumer.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::trace;

use crate::protocol::{Message, NowPlaying};

use super::track::NowPlayingSource;

// ============================================================================
// Clock
// ============================================================================

/// Wall-clock source in Unix milliseconds. Injectable for tests.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// The system wall clock.
fn system_clock() -> Clock {
    Arc::new(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or_default()
    })
}

// ============================================================================
// PlaybackSnapshot
// ============================================================================

/// Derived description of a playing item at a point in time.
///
/// Transient: computed once per play event, emitted, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    /// Display artist name.
    pub artist: String,

    /// Track title.
    pub title: String,

    /// Unix ms at which playback effectively started.
    pub start_unix_ms: i64,

    /// Unix ms at which playback will end if uninterrupted.
    pub end_unix_ms: i64,

    /// Artwork image URL, if any.
    pub artwork_url: Option<String>,

    /// Permalink URL of the track.
    pub track_url: String,
}

impl PlaybackSnapshot {
    /// Converts the snapshot into its wire message.
    #[must_use]
    pub fn into_message(self) -> Message {
        Message::TrackNowPlaying(NowPlaying {
            artist: self.artist,
            title: self.title,
            start_time: self.start_unix_ms,
            end_time: self.end_unix_ms,
            artwork_url: self.artwork_url,
            track_url: self.track_url,
        })
    }
}

// ============================================================================
// PlaybackEventBridge
// ============================================================================

/// Computes [`PlaybackSnapshot`]s from intercepted playback state.
pub struct PlaybackEventBridge {
    /// Wall-clock source.
    clock: Clock,
}

impl Default for PlaybackEventBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEventBridge {
    /// Creates a bridge using the system wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: system_clock(),
        }
    }

    /// Creates a bridge with an injected clock.
    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }

    /// Computes a snapshot of the given item at the current instant.
    ///
    /// A position-read failure is swallowed and treated as zero.
    #[must_use]
    pub fn snapshot(&self, source: &dyn NowPlayingSource) -> PlaybackSnapshot {
        let position = source.position_ms().unwrap_or(0);
        let now = (self.clock)();
        let time_left = source.duration_ms() - position;

        trace!(position, time_left, "playback snapshot");

        PlaybackSnapshot {
            artist: source.artist(),
            title: source.title(),
            start_unix_ms: now - position,
            end_unix_ms: now + time_left,
            artwork_url: source.artwork_url(),
            track_url: source.track_url(),
        }
    }

    /// Computes a snapshot and wraps it as a `track-now-playing` message.
    #[must_use]
    pub fn message(&self, source: &dyn NowPlayingSource) -> Message {
        self.snapshot(source).into_message()
    }
}

// ============================================================================
// Tests
// ============================================================================
