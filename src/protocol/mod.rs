//! Wire protocol message types.
//!
//! Defines the JSON envelope exchanged with the desktop endpoint over the
//! outbound WebSocket. The envelope is `{ "type": string, "data": object }`
//! with a small closed set of types.
//!
//! # Message Types
//!
//! | Type | Direction | Data |
//! |------|-----------|------|
//! | `track-now-playing` | emitted | `artist`, `title`, `start_time`, `end_time`, `artwork_url`, `track_url` |
//! | `play-track-request` | consumed | `trackUrl` |
//!
//! Timestamps are Unix milliseconds. There is no request/response
//! correlation: every message is fire-and-forget.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ============================================================================
// Message
// ============================================================================

/// A wire message exchanged with the desktop endpoint.
///
/// # Format
///
/// ```json
/// {
///   "type": "track-now-playing",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Message {
    /// A track began playing in the host application.
    #[serde(rename = "track-now-playing")]
    TrackNowPlaying(NowPlaying),

    /// The desktop peer requests playback of a track.
    #[serde(rename = "play-track-request")]
    PlayTrackRequest(PlayRequest),
}

impl Message {
    /// Returns the wire type tag of this message.
    #[inline]
    #[must_use]
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::TrackNowPlaying(_) => "track-now-playing",
            Self::PlayTrackRequest(_) => "play-track-request",
        }
    }

    /// Serializes the message to its wire JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a message from its wire JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] on malformed payloads or unknown types.
    /// Callers on the socket path log and drop the message; the connection
    /// stays usable.
    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

// ============================================================================
// NowPlaying
// ============================================================================

/// Payload of a `track-now-playing` message.
///
/// Derived from a [`PlaybackSnapshot`](crate::playback::PlaybackSnapshot) at
/// the instant a track begins playing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    /// Display artist name.
    pub artist: String,

    /// Track title.
    pub title: String,

    /// Unix ms at which playback of this track effectively started.
    pub start_time: i64,

    /// Unix ms at which playback will end if uninterrupted.
    pub end_time: i64,

    /// Artwork image URL, if the host exposes one.
    pub artwork_url: Option<String>,

    /// Permalink URL of the track.
    pub track_url: String,
}

// ============================================================================
// PlayRequest
// ============================================================================

/// Payload of a `play-track-request` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRequest {
    /// Permalink URL of the track to play.
    #[serde(rename = "trackUrl")]
    pub track_url: String,
}

// ============================================================================
// Tests
// ============================================================================
