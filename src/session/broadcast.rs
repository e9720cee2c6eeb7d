//! Outbound delivery to connected clients.
//!
//! The transport owns the sockets; this module only defines the contract the
//! session layer calls into and a channel-backed implementation that hands
//! messages to whatever task drives the transport.
//!
//! ## Ordering
//!
//! `ChannelBroadcaster` feeds a single unbounded queue, so messages for a
//! given match arrive in call order. No ordering is promised across matches
//! beyond that.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::core::{MatchId, MatchSnapshot, PlayerId, TransportAddress};

/// Events sent to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    /// Sent only to the joining client once they are seated.
    #[serde(rename_all = "camelCase")]
    GameJoined { match_id: MatchId, player_id: PlayerId },

    /// Full match state, sent to every participant after each mutation.
    GameState(Arc<MatchSnapshot>),
}

/// A message queued for the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    /// Deliver to every participant of the match.
    Room { match_id: MatchId, event: OutboundEvent },
    /// Deliver to one client.
    Direct { to: TransportAddress, event: OutboundEvent },
}

impl Outbound {
    #[must_use]
    pub fn event(&self) -> &OutboundEvent {
        match self {
            Outbound::Room { event, .. } | Outbound::Direct { event, .. } => event,
        }
    }

    /// Encode the event as a JSON text frame.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self.event())
    }
}

/// Pushes events to clients.
///
/// Implementations must not block: they are called while the match is
/// locked, which is what keeps per-match delivery in call order.
pub trait Broadcaster: Send + Sync {
    /// Send a snapshot to every participant of `match_id`.
    fn publish(&self, match_id: &MatchId, snapshot: Arc<MatchSnapshot>);

    /// Send an event to a single client.
    fn send_to(&self, to: &TransportAddress, event: OutboundEvent);
}

/// Broadcaster backed by an unbounded tokio channel.
#[derive(Clone, Debug)]
pub struct ChannelBroadcaster {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelBroadcaster {
    /// Create a broadcaster and the receiver the transport drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn enqueue(&self, message: Outbound) {
        if self.tx.send(message).is_err() {
            warn!("transport receiver dropped; outbound message discarded");
        }
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn publish(&self, match_id: &MatchId, snapshot: Arc<MatchSnapshot>) {
        self.enqueue(Outbound::Room {
            match_id: match_id.clone(),
            event: OutboundEvent::GameState(snapshot),
        });
    }

    fn send_to(&self, to: &TransportAddress, event: OutboundEvent) {
        self.enqueue(Outbound::Direct {
            to: to.clone(),
            event,
        });
    }
}
