//! Currently-playing item sources.
//!
//! [`NowPlayingSource`] is the seam between the playback bridge and whatever
//! object the host hands us for the current item. [`HostTrack`] adapts the
//! host's sound object shape: a nested `player` with a position reader that
//! may fail, an `attributes` descriptor with display metadata, and a
//! computed display artist on the item itself.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::host::HostObject;

// ============================================================================
// Host Slot Names
// ============================================================================

/// Nested player object on a sound item.
const PLAYER: &str = "player";

/// Position reader on the player. May fail between tracks.
const GET_POSITION: &str = "getPosition";

/// Metadata descriptor on a sound item.
const ATTRIBUTES: &str = "attributes";

/// Computed display artist on the item itself.
const DISPLAY_ARTIST: &str = "computed__displayArtist";

// ============================================================================
// NowPlayingSource
// ============================================================================

/// A currently-playing item.
///
/// The position reader is the only fallible accessor: the host raises from
/// it while transitioning between tracks, and consumers treat that failure
/// as position zero.
pub trait NowPlayingSource {
    /// Current playback position in milliseconds. May fail.
    fn position_ms(&self) -> Result<i64>;

    /// Track duration in milliseconds.
    fn duration_ms(&self) -> i64;

    /// Display artist name.
    fn artist(&self) -> String;

    /// Track title.
    fn title(&self) -> String;

    /// Artwork image URL, if any.
    fn artwork_url(&self) -> Option<String>;

    /// Permalink URL of the track.
    fn track_url(&self) -> String;
}

// ============================================================================
// HostTrack
// ============================================================================

/// Adapter over the host's sound object.
#[derive(Debug, Clone)]
pub struct HostTrack {
    /// The host's current-item object.
    sound: Arc<HostObject>,
}

impl HostTrack {
    /// Wraps a host sound object.
    #[inline]
    #[must_use]
    pub fn new(sound: Arc<HostObject>) -> Self {
        Self { sound }
    }

    /// Returns `true` if the item carries a populated attributes descriptor.
    ///
    /// Items without attributes are placeholders and emit no playback event.
    #[inline]
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.sound.object(ATTRIBUTES).is_some()
    }

    /// Returns the attributes descriptor, if present.
    fn attributes(&self) -> Option<Arc<HostObject>> {
        self.sound.object(ATTRIBUTES)
    }
}

impl NowPlayingSource for HostTrack {
    fn position_ms(&self) -> Result<i64> {
        let player = self
            .sound
            .object(PLAYER)
            .ok_or_else(|| Error::host_call("item has no player"))?;
        let value = player.call(GET_POSITION, &[])?;
        value
            .as_i64()
            .ok_or_else(|| Error::host_call("position is not a number"))
    }

    fn duration_ms(&self) -> i64 {
        self.attributes()
            .and_then(|attributes| attributes.integer("duration"))
            .unwrap_or_default()
    }

    fn artist(&self) -> String {
        self.sound.string(DISPLAY_ARTIST).unwrap_or_default()
    }

    fn title(&self) -> String {
        self.attributes()
            .and_then(|attributes| attributes.string("title"))
            .unwrap_or_default()
    }

    fn artwork_url(&self) -> Option<String> {
        self.attributes()
            .and_then(|attributes| attributes.string("artwork_url"))
    }

    fn track_url(&self) -> String {
        self.attributes()
            .and_then(|attributes| attributes.string("permalink_url"))
            .unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
