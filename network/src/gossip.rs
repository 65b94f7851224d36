//! Outbound and inbound handling of `TOKENTX` messages.
//!
//! The broadcaster does not write to TCP streams directly. It pushes
//! [`OutboundMessage`] entries onto an `mpsc` channel that the connection
//! layer drains, one entry per connected peer.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use itc_token_ledger::{TokenGossip, TokenLedger, TokenOperation};

use crate::peers::{PeerRegistry, MISBEHAVIOR_INVALID_TOKEN_OP};
use crate::NetworkError;

/// Wire kind of the token operation gossip message. The payload is the
/// canonical operation serialization, with no extra framing.
pub const TOKENTX: &str = "tokentx";

/// A message queued for one peer.
#[derive(Clone, Debug)]
pub struct OutboundMessage {
    pub peer_id: String,
    pub kind: &'static str,
    pub payload: Vec<u8>,
}

/// Outcome of a broadcast round.
#[derive(Clone, Debug, Default)]
pub struct BroadcastResult {
    pub sent: usize,
    pub failed: usize,
}

/// Flood-based broadcaster for token operations.
#[derive(Clone)]
pub struct TokenBroadcaster {
    peers: Arc<Mutex<PeerRegistry>>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
}

impl TokenBroadcaster {
    pub fn new(peers: Arc<Mutex<PeerRegistry>>, outbound_tx: mpsc::Sender<OutboundMessage>) -> Self {
        Self { peers, outbound_tx }
    }

    /// Queue `payload` as a `TOKENTX` message for every connected peer.
    pub fn broadcast_to_all(&self, payload: &[u8]) -> BroadcastResult {
        let peer_ids = self
            .peers
            .lock()
            .expect("peer registry mutex poisoned")
            .connected_peers();

        let mut result = BroadcastResult::default();
        for peer_id in peer_ids {
            let message = OutboundMessage {
                peer_id,
                kind: TOKENTX,
                payload: payload.to_vec(),
            };
            match self.outbound_tx.try_send(message) {
                Ok(()) => result.sent += 1,
                Err(_) => result.failed += 1,
            }
        }
        result
    }
}

impl TokenGossip for TokenBroadcaster {
    fn broadcast_operation(&self, payload: &[u8]) {
        let result = self.broadcast_to_all(payload);
        if result.failed > 0 {
            warn!(sent = result.sent, failed = result.failed, "token broadcast partially failed");
        } else {
            debug!(sent = result.sent, "token operation broadcast");
        }
    }
}

/// Inbound handler for `TOKENTX` messages.
///
/// Must be stopped before the ledger is dropped on shutdown so late
/// deliveries cannot touch torn-down state.
pub struct GossipHandler {
    ledger: Arc<TokenLedger>,
    peers: Arc<Mutex<PeerRegistry>>,
}

impl GossipHandler {
    pub fn new(ledger: Arc<TokenLedger>, peers: Arc<Mutex<PeerRegistry>>) -> Self {
        Self { ledger, peers }
    }

    /// Handle one inbound `TOKENTX` payload from a peer.
    ///
    /// Every failure mode — undecodable payload, invalid signature,
    /// duplicate, precondition failure — penalizes the peer by a small
    /// fixed weight; banning is left to the registry's threshold.
    pub fn handle_tokentx(&self, peer_id: &str, payload: &[u8]) -> Result<(), NetworkError> {
        let op = match TokenOperation::from_wire_bytes(payload) {
            Ok(op) => op,
            Err(err) => {
                debug!(peer = peer_id, %err, "undecodable TOKENTX payload");
                self.penalize(peer_id);
                return Ok(());
            }
        };

        match self.ledger.apply(&op, "", false)? {
            true => debug!(peer = peer_id, token = %op.token, "accepted gossiped token operation"),
            false => self.penalize(peer_id),
        }
        Ok(())
    }

    fn penalize(&self, peer_id: &str) {
        self.peers
            .lock()
            .expect("peer registry mutex poisoned")
            .penalize(peer_id, MISBEHAVIOR_INVALID_TOKEN_OP, "invalid token operation");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_peers(ids: &[&str]) -> Arc<Mutex<PeerRegistry>> {
        let mut registry = PeerRegistry::new();
        for id in ids {
            registry.connect(id);
        }
        Arc::new(Mutex::new(registry))
    }

    #[test]
    fn broadcast_reaches_every_connected_peer() {
        let peers = registry_with_peers(&["a:1", "b:2", "c:3"]);
        let (tx, mut rx) = mpsc::channel(16);
        let broadcaster = TokenBroadcaster::new(peers, tx);

        let result = broadcaster.broadcast_to_all(b"op-bytes");
        assert_eq!(result.sent, 3);
        assert_eq!(result.failed, 0);

        let mut received = Vec::new();
        while let Ok(message) = rx.try_recv() {
            assert_eq!(message.kind, TOKENTX);
            assert_eq!(message.payload, b"op-bytes");
            received.push(message.peer_id);
        }
        received.sort();
        assert_eq!(received, vec!["a:1", "b:2", "c:3"]);
    }

    #[test]
    fn broadcast_skips_banned_peers() {
        let peers = registry_with_peers(&["a:1", "b:2"]);
        peers
            .lock()
            .unwrap()
            .penalize("a:1", 100, "protocol violation");

        let (tx, mut rx) = mpsc::channel(16);
        let broadcaster = TokenBroadcaster::new(peers, tx);

        let result = broadcaster.broadcast_to_all(b"op");
        assert_eq!(result.sent, 1);
        assert_eq!(rx.try_recv().unwrap().peer_id, "b:2");
    }

    #[test]
    fn full_channel_counts_failures() {
        let peers = registry_with_peers(&["a:1", "b:2", "c:3"]);
        let (tx, _rx) = mpsc::channel(1);
        let broadcaster = TokenBroadcaster::new(peers, tx);

        let result = broadcaster.broadcast_to_all(b"op");
        assert_eq!(result.sent + result.failed, 3);
        assert!(result.failed >= 2);
    }
}
