//! Periodic reconnection supervision.
//!
//! The [`SocketChannel`](super::channel::SocketChannel) never retries on its
//! own. The supervisor owns the retry policy instead: a fixed-period probe
//! that attempts a connection only when at least one consumer page is live
//! and the channel is fully Disconnected. Probes while Connecting or
//! Connected are no-ops, so at most one connection attempt is ever in
//! flight.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, trace};

use crate::config::BridgeConfig;
use crate::relay::PageDirectory;

use super::channel::{ConnectionState, SocketChannel};

// ============================================================================
// ReconnectionSupervisor
// ============================================================================

/// Drives reconnection probes for one channel.
pub struct ReconnectionSupervisor {
    /// Channel under supervision.
    channel: SocketChannel,

    /// Live consumer pages; an empty directory suppresses probes.
    pages: Arc<dyn PageDirectory>,

    /// Time between probes.
    period: Duration,
}

impl ReconnectionSupervisor {
    /// Creates a supervisor with the configured probe period.
    #[must_use]
    pub fn new(
        config: &BridgeConfig,
        channel: SocketChannel,
        pages: Arc<dyn PageDirectory>,
    ) -> Self {
        Self {
            channel,
            pages,
            period: config.probe_period,
        }
    }

    /// Runs one probe.
    ///
    /// Connects only if a consumer page is live and the channel is
    /// Disconnected. A probe that fires while a previous attempt is still
    /// Connecting does nothing.
    pub async fn probe(&self) {
        if self.pages.pages().await.is_empty() {
            trace!("no consumer pages; probe skipped");
            return;
        }

        if self.channel.state() != ConnectionState::Disconnected {
            trace!(state = ?self.channel.state(), "channel active; probe skipped");
            return;
        }

        debug!("consumer present and channel idle; attempting connection");
        self.channel.connect();
    }

    /// Spawns the probe loop. Runs until the returned handle is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticks = interval(self.period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                self.probe().await;
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
