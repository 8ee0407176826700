use tokio::sync::mpsc;

use super::envelope::{Envelope, Message};
use crate::config::MESSAGE_CHAN_SIZE;

// --- Best-Effort Channel ---

/// One-way, fire-and-forget sender half. Mirrors the postMessage primitive:
/// no delivery confirmation, no ordering promise, and a full or torn-down
/// peer just swallows the message.
#[derive(Clone)]
pub struct Messenger {
    tx: mpsc::Sender<Envelope>,
    origin: String,
}

impl Messenger {
    pub fn new(tx: mpsc::Sender<Envelope>, origin: impl Into<String>) -> Self {
        Messenger {
            tx,
            origin: origin.into(),
        }
    }

    pub fn send(&self, message: Message) {
        let envelope = Envelope {
            origin: self.origin.clone(),
            message,
        };
        if let Err(e) = self.tx.try_send(envelope) {
            // Best-effort by contract; losing a message here is normal.
            log::debug!("Cross-context message dropped: {}", e);
        }
    }
}

/// One context's view of the boundary: its outbound messenger and the queue
/// of envelopes the peer addressed to it.
pub struct Endpoint {
    pub outbound: Messenger,
    pub inbound: mpsc::Receiver<Envelope>,
}

/// Wire up both directions. Returns `(player_endpoint, host_endpoint)`;
/// each messenger stamps envelopes with its own context's origin, the way a
/// browser transport attributes postMessage events.
pub fn link(player_origin: &str, host_origin: &str) -> (Endpoint, Endpoint) {
    let (to_host_tx, to_host_rx) = mpsc::channel(MESSAGE_CHAN_SIZE);
    let (to_player_tx, to_player_rx) = mpsc::channel(MESSAGE_CHAN_SIZE);

    let player = Endpoint {
        outbound: Messenger::new(to_host_tx, player_origin),
        inbound: to_player_rx,
    };
    let host = Endpoint {
        outbound: Messenger::new(to_player_tx, host_origin),
        inbound: to_host_rx,
    };
    (player, host)
}
