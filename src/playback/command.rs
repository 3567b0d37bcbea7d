//! Externally commanded playback.
//!
//! Executes `play-track-request` messages arriving from the desktop peer:
//! fetch the track's metadata through the collaborator seam, instantiate a
//! track model via the captured constructor, request preloading, seek to the
//! start, and invoke the captured playback trigger.
//!
//! Playback commands are best-effort: the fallible form reports why a
//! command did not execute (invalid URL, network, missing capability,
//! host-side error), and the fire-and-forget form swallows all of it. A
//! capability that was never captured degrades the operation to a no-op;
//! that is the documented policy, not a fault surfaced to the peer.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::capability::{Capability, CapabilityRegistry};
use crate::error::{Error, Result};
use crate::host::HostValue;

// ============================================================================
// Host Slot Names
// ============================================================================

/// Preloading request on a freshly constructed model.
const REQUEST_PRELOADING: &str = "requestPreloading";

/// Nested player object on a model.
const PLAYER: &str = "player";

/// Seek method on the player.
const SEEK: &str = "seek";

// ============================================================================
// TrackMetadataFetcher
// ============================================================================

/// External collaborator that resolves a track URL to track data.
///
/// Out of scope for this crate beyond the interface: implementations fetch
/// the track page and typically feed it through
/// [`extract_sound_data`](super::hydration::extract_sound_data). Failure or
/// an absent result means no playback command executes.
#[async_trait]
pub trait TrackMetadataFetcher: Send + Sync {
    /// Resolves a track URL to its track-data object, if any.
    async fn fetch(&self, track_url: &str) -> Result<Option<Value>>;
}

// ============================================================================
// PlaybackCommander
// ============================================================================

/// Executes playback commands against captured capabilities.
pub struct PlaybackCommander {
    /// Captured host capabilities.
    registry: Arc<CapabilityRegistry>,

    /// Track metadata collaborator.
    fetcher: Arc<dyn TrackMetadataFetcher>,
}

impl PlaybackCommander {
    /// Creates a commander.
    #[must_use]
    pub fn new(registry: Arc<CapabilityRegistry>, fetcher: Arc<dyn TrackMetadataFetcher>) -> Self {
        Self { registry, fetcher }
    }

    /// Plays the given track, best-effort.
    ///
    /// Fire-and-forget form of [`try_play_track`](Self::try_play_track):
    /// every failure is logged and swallowed.
    pub async fn play_track(&self, track_url: &str) {
        if let Err(error) = self.try_play_track(track_url).await {
            debug!(track_url, %error, "play request dropped");
        }
    }

    /// Plays the given track, reporting why the command did not execute.
    ///
    /// Policy: playback always restarts from the beginning; the model is
    /// sought to position zero before the trigger fires. In-flight fetches
    /// superseded by a newer request are not cancelled.
    pub async fn try_play_track(&self, track_url: &str) -> Result<()> {
        if Url::parse(track_url).is_err() {
            return Err(Error::invalid_track_url(track_url));
        }

        let data = self
            .fetcher
            .fetch(track_url)
            .await?
            .ok_or_else(|| Error::metadata(format!("no track data for {track_url}")))?;

        let ctor = self
            .registry
            .get(Capability::InstantiateTrackModel)
            .ok_or_else(|| Error::missing_capability(Capability::InstantiateTrackModel))?;
        let model = ctor.construct(Capability::InstantiateTrackModel, &HostValue::Data(data))?;

        let _ = model.call(REQUEST_PRELOADING, &[]);
        if let Some(player) = model.object(PLAYER) {
            let _ = player.call(SEEK, &[HostValue::data(0)]);
        }

        let play = self
            .registry
            .get(Capability::BeginPlayback)
            .ok_or_else(|| Error::missing_capability(Capability::BeginPlayback))?;
        play.invoke(&[HostValue::Object(model)])?;
        Ok(())
    }

    /// Reads the playback queue. `None` while the capability is uncaptured
    /// or if the host call fails.
    #[must_use]
    pub fn read_queue(&self) -> Option<HostValue> {
        self.invoke_captured(Capability::ReadQueue, &[])
    }

    /// Appends an explicit item to the playback queue.
    #[must_use]
    pub fn append_to_queue(&self, item: HostValue) -> Option<HostValue> {
        self.invoke_captured(Capability::AppendToQueue, &[item])
    }

    /// Reads the current queue item.
    #[must_use]
    pub fn read_current_queue_item(&self) -> Option<HostValue> {
        self.invoke_captured(Capability::ReadCurrentQueueItem, &[])
    }

    /// Invokes a captured capability; silent no-op while uncaptured.
    fn invoke_captured(&self, capability: Capability, args: &[HostValue]) -> Option<HostValue> {
        let reference = self.registry.get(capability)?;
        reference.invoke(args).ok()
    }
}

// ============================================================================
// Tests
// ============================================================================
