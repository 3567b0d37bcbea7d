//! Message relay across execution contexts.
//!
//! Messages cross three contexts: the desktop endpoint's socket, the
//! coordination context that owns it, and any number of page contexts. The
//! relay moves envelopes between them with loop prevention by provenance:
//! every envelope records where it entered the system, and a socket-origin
//! envelope echoed back by a page is never re-sent to the socket.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`page`] | Page-context bridge: filtering, publishing, command dispatch |
//!
//! Delivery is best-effort everywhere: a page that went away mid-fan-out is
//! skipped, not retried, and the next registration cycle rediscovers the
//! surviving consumers.

// ============================================================================
// Submodules
// ============================================================================

/// Page-context bridge.
pub mod page;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::protocol::Message;
use crate::socket::SocketChannel;

pub use page::PageBridge;

// ============================================================================
// Constants
// ============================================================================

/// Source tag stamped on every envelope we emit.
///
/// Page contexts share their message channel with unrelated traffic; the
/// tag is how a [`PageBridge`] tells our envelopes from everything else.
pub const ENVELOPE_SOURCE: &str = "SOUNDBRIDGE";

// ============================================================================
// Types
// ============================================================================

/// Where an envelope entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Arrived from the desktop endpoint's socket.
    Socket,

    /// Originated in a page context.
    Page,
}

/// A message plus its routing metadata.
///
/// The provenance travels with the payload through every context it
/// crosses; it is never rewritten after construction.
#[derive(Debug, Clone)]
pub struct RelayEnvelope {
    /// Source tag; [`ENVELOPE_SOURCE`] on everything we emit.
    pub source: String,

    /// Entry point of the payload.
    pub provenance: Provenance,

    /// The wire message itself.
    pub payload: Message,
}

impl RelayEnvelope {
    /// Wraps a message that arrived from the socket.
    #[must_use]
    pub fn from_socket(payload: Message) -> Self {
        Self {
            source: ENVELOPE_SOURCE.to_owned(),
            provenance: Provenance::Socket,
            payload,
        }
    }

    /// Wraps a message originating in a page context.
    #[must_use]
    pub fn from_page(payload: Message) -> Self {
        Self {
            source: ENVELOPE_SOURCE.to_owned(),
            provenance: Provenance::Page,
            payload,
        }
    }

    /// Whether this envelope carries our source tag.
    #[inline]
    #[must_use]
    pub fn is_ours(&self) -> bool {
        self.source == ENVELOPE_SOURCE
    }
}

// ============================================================================
// PageEndpoint
// ============================================================================

/// Delivery handle for one registered page context.
#[derive(Clone)]
pub struct PageEndpoint {
    /// Sender into the page's envelope stream.
    tx: mpsc::UnboundedSender<RelayEnvelope>,
}

impl PageEndpoint {
    /// Creates an endpoint delivering into the given stream.
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<RelayEnvelope>) -> Self {
        Self { tx }
    }

    /// Delivers one envelope. Returns `false` if the page is gone.
    pub fn deliver(&self, envelope: RelayEnvelope) -> bool {
        self.tx.send(envelope).is_ok()
    }
}

// ============================================================================
// Seams
// ============================================================================

/// Registry of currently live page contexts.
///
/// The coordination context queries this on every fan-out and every
/// reconnection probe; implementations return the consumers matching the
/// configured pattern at that instant.
#[async_trait]
pub trait PageDirectory: Send + Sync {
    /// Returns delivery handles for all live matching pages.
    async fn pages(&self) -> Vec<PageEndpoint>;
}

/// Outbound side of the socket, as the relay sees it.
pub trait OutboundSink: Send + Sync {
    /// Sends one message toward the desktop endpoint, best-effort.
    fn send_message(&self, message: &Message);
}

impl OutboundSink for SocketChannel {
    fn send_message(&self, message: &Message) {
        self.send(message);
    }
}

// ============================================================================
// MessageRelay
// ============================================================================

/// Coordination-context router between the socket and the page contexts.
pub struct MessageRelay {
    /// Live page contexts.
    pages: Arc<dyn PageDirectory>,

    /// Outbound socket side.
    socket: Arc<dyn OutboundSink>,
}

impl MessageRelay {
    /// Creates a relay over the given directory and socket.
    #[must_use]
    pub fn new(pages: Arc<dyn PageDirectory>, socket: Arc<dyn OutboundSink>) -> Self {
        Self { pages, socket }
    }

    /// Fans one socket-origin message out to every live page.
    ///
    /// Returns the number of pages actually reached. Dead pages are skipped
    /// without retry.
    pub async fn deliver_from_socket(&self, message: Message) -> usize {
        let envelope = RelayEnvelope::from_socket(message);

        let mut delivered = 0;
        for page in self.pages.pages().await {
            if page.deliver(envelope.clone()) {
                delivered += 1;
            }
        }

        debug!(
            delivered,
            message_type = envelope.payload.message_type(),
            "socket message fanned out"
        );
        delivered
    }

    /// Forwards one page-side envelope toward the socket.
    ///
    /// Socket-origin envelopes echoed back by a page context are dropped
    /// here; this is the loop-prevention point.
    pub fn deliver_from_page(&self, envelope: RelayEnvelope) {
        if envelope.provenance == Provenance::Socket {
            trace!(
                message_type = envelope.payload.message_type(),
                "socket-origin envelope not sent back to socket"
            );
            return;
        }

        self.socket.send_message(&envelope.payload);
    }

    /// Wires this relay in as the channel's inbound handler.
    ///
    /// Inbound messages are queued into a single worker task, so fan-out
    /// preserves transport arrival order. The worker ends when the channel
    /// drops its handler.
    pub fn attach(self: &Arc<Self>, channel: &SocketChannel) {
        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();

        let relay = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(message) = inbound_rx.recv().await {
                relay.deliver_from_socket(message).await;
            }
        });

        channel.set_message_handler(Box::new(move |message| {
            let _ = inbound_tx.send(message);
        }));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use parking_lot::Mutex;

    use crate::protocol::{NowPlaying, PlayRequest};

    /// Directory over a fixed endpoint list.
    pub(crate) struct StaticDirectory {
        endpoints: Mutex<Vec<PageEndpoint>>,
    }

    impl StaticDirectory {
        pub(crate) fn new(endpoints: Vec<PageEndpoint>) -> Arc<Self> {
            Arc::new(Self {
                endpoints: Mutex::new(endpoints),
            })
        }

        pub(crate) fn empty() -> Arc<Self> {
            Self::new(Vec::new())
        }
    }

    #[async_trait]
    impl PageDirectory for StaticDirectory {
        async fn pages(&self) -> Vec<PageEndpoint> {
            self.endpoints.lock().clone()
        }
    }

    /// Sink that records every message instead of sending it.
    pub(crate) struct RecordingSink {
        pub(crate) sent: Mutex<Vec<Message>>,
    }

    impl RecordingSink {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    impl OutboundSink for RecordingSink {
        fn send_message(&self, message: &Message) {
            self.sent.lock().push(message.clone());
        }
    }

    fn play_request() -> Message {
        Message::PlayTrackRequest(PlayRequest {
            track_url: "https://example.com/artist/track".into(),
        })
    }

    fn now_playing() -> Message {
        Message::TrackNowPlaying(NowPlaying {
            artist: "Artist".into(),
            title: "Title".into(),
            start_time: 10,
            end_time: 20,
            artwork_url: None,
            track_url: "https://example.com/artist/track".into(),
        })
    }

    #[tokio::test]
    async fn test_socket_message_reaches_every_page_once() {
        let mut receivers = Vec::new();
        let mut endpoints = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::unbounded_channel();
            endpoints.push(PageEndpoint::new(tx));
            receivers.push(rx);
        }

        let sink = RecordingSink::new();
        let relay = MessageRelay::new(StaticDirectory::new(endpoints), sink.clone());

        let delivered = relay.deliver_from_socket(play_request()).await;
        assert_eq!(delivered, 3);

        for rx in &mut receivers {
            let envelope = rx.try_recv().expect("one delivery per page");
            assert!(envelope.is_ours());
            assert_eq!(envelope.provenance, Provenance::Socket);
            assert_eq!(envelope.payload, play_request());
            assert!(rx.try_recv().is_err(), "page received more than once");
        }
    }

    #[tokio::test]
    async fn test_page_echo_of_socket_envelope_is_not_sent_back() {
        let sink = RecordingSink::new();
        let relay = MessageRelay::new(StaticDirectory::empty(), sink.clone());

        // A page context forwards everything it sees, including envelopes
        // that came from the socket in the first place. Those must die here.
        relay.deliver_from_page(RelayEnvelope::from_socket(play_request()));
        assert!(sink.sent.lock().is_empty());

        relay.deliver_from_page(RelayEnvelope::from_page(now_playing()));
        assert_eq!(sink.sent.lock().as_slice(), &[now_playing()]);
    }

    #[tokio::test]
    async fn test_dead_pages_are_skipped() {
        let (live_tx, mut live_rx) = mpsc::unbounded_channel();
        let (dead_tx, dead_rx) = mpsc::unbounded_channel::<RelayEnvelope>();
        drop(dead_rx);

        let relay = MessageRelay::new(
            StaticDirectory::new(vec![PageEndpoint::new(dead_tx), PageEndpoint::new(live_tx)]),
            RecordingSink::new(),
        );

        let delivered = relay.deliver_from_socket(now_playing()).await;
        assert_eq!(delivered, 1);
        assert!(live_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_attached_channel_preserves_arrival_order() {
        use std::time::Duration;

        use futures_util::SinkExt;
        use tokio::net::TcpListener;
        use tokio::time::timeout;
        use tokio_tungstenite::tungstenite::Message as WsMessage;

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let server = tokio::spawn(async move {
            let (stream, _addr) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream).await.expect("upgrade");
            for index in 0..10 {
                let payload = format!(
                    r#"{{"type":"play-track-request","data":{{"trackUrl":"https://example.com/a/t{index}"}}}}"#
                );
                ws.send(WsMessage::Text(payload.into())).await.expect("send");
            }
            // Hold the connection open until the client drained everything.
            tokio::time::sleep(Duration::from_secs(2)).await;
        });

        let (page_tx, mut page_rx) = mpsc::unbounded_channel();
        let channel = SocketChannel::with_endpoint(format!("ws://127.0.0.1:{port}"));
        let relay = Arc::new(MessageRelay::new(
            StaticDirectory::new(vec![PageEndpoint::new(page_tx)]),
            Arc::new(channel.clone()),
        ));
        relay.attach(&channel);
        channel.connect();

        // Back-to-back messages fan out in transport arrival order.
        for index in 0..10 {
            let envelope = timeout(Duration::from_secs(5), page_rx.recv())
                .await
                .expect("delivery within timeout")
                .expect("page stream open");
            let Message::PlayTrackRequest(request) = envelope.payload else {
                panic!("unexpected message type");
            };
            assert_eq!(request.track_url, format!("https://example.com/a/t{index}"));
        }

        server.abort();
    }

    #[tokio::test]
    async fn test_full_round_trip_with_echoing_pages() {
        // Three pages, each of which echoes every envelope it receives
        // straight back to the coordination context.
        let mut receivers = Vec::new();
        let mut endpoints = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::unbounded_channel();
            endpoints.push(PageEndpoint::new(tx));
            receivers.push(rx);
        }

        let sink = RecordingSink::new();
        let relay = Arc::new(MessageRelay::new(
            StaticDirectory::new(endpoints),
            sink.clone(),
        ));

        let delivered = relay.deliver_from_socket(play_request()).await;
        assert_eq!(delivered, 3);

        for rx in &mut receivers {
            let envelope = rx.try_recv().expect("one delivery per page");
            relay.deliver_from_page(envelope);
            assert!(rx.try_recv().is_err());
        }

        // None of the echoes made it back out to the socket.
        assert!(sink.sent.lock().is_empty());

        // A genuine page-origin event still does.
        relay.deliver_from_page(RelayEnvelope::from_page(now_playing()));
        assert_eq!(sink.sent.lock().len(), 1);
    }
}
