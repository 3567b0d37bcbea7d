//! Page-context bridge.
//!
//! Each page context runs one [`PageBridge`]. It is the page's only door in
//! either direction: intercepted playback events leave through
//! [`PageBridge::publish`], and envelopes arriving from the coordination
//! context come in through [`PageBridge::handle_envelope`], which filters by
//! source tag and dispatches playback commands.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::trace;

use crate::capability::EmitFn;
use crate::playback::PlaybackCommander;
use crate::protocol::Message;

use super::RelayEnvelope;

// ============================================================================
// PageBridge
// ============================================================================

/// One page context's connection to the coordination context.
pub struct PageBridge {
    /// Executes playback commands against this page's captured capabilities.
    commander: Arc<PlaybackCommander>,

    /// Envelope stream toward the coordination context.
    to_coordination: mpsc::UnboundedSender<RelayEnvelope>,
}

impl PageBridge {
    /// Creates a bridge publishing into the given coordination stream.
    #[must_use]
    pub fn new(
        commander: Arc<PlaybackCommander>,
        to_coordination: mpsc::UnboundedSender<RelayEnvelope>,
    ) -> Self {
        Self {
            commander,
            to_coordination,
        }
    }

    /// Publishes a page-origin message toward the coordination context.
    ///
    /// Best-effort: if the coordination side is gone the message is dropped.
    pub fn publish(&self, message: Message) {
        let _ = self.to_coordination.send(RelayEnvelope::from_page(message));
    }

    /// Emit hook for the module scanner, feeding intercepted playback
    /// events into this bridge.
    #[must_use]
    pub fn emitter(self: &Arc<Self>) -> EmitFn {
        let bridge = Arc::clone(self);
        Arc::new(move |message| bridge.publish(message))
    }

    /// Handles one envelope delivered from the coordination context.
    ///
    /// The page's message channel carries unrelated traffic too; anything
    /// without our source tag is ignored without inspection.
    pub async fn handle_envelope(&self, envelope: RelayEnvelope) {
        if !envelope.is_ours() {
            trace!(source = %envelope.source, "foreign envelope ignored");
            return;
        }

        match envelope.payload {
            Message::PlayTrackRequest(request) => {
                self.commander.play_track(&request.track_url).await;
            }
            other => {
                trace!(
                    message_type = other.message_type(),
                    "no page-side action for message"
                );
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
