//! Peer tracking with misbehavior scoring and banning.
//!
//! The transport owns connections; this registry only tracks which peers
//! are connected and how badly they have behaved. A peer whose
//! misbehavior score reaches the ban threshold is banned and excluded
//! from broadcasts — a single invalid message never bans on its own.

use std::collections::HashMap;

use tracing::{debug, warn};

/// Misbehavior weight for an invalid token operation.
pub const MISBEHAVIOR_INVALID_TOKEN_OP: i32 = 10;

/// Score at which a peer is banned.
const BAN_THRESHOLD: i32 = 100;

#[derive(Clone, Debug, Default)]
struct PeerEntry {
    connected: bool,
    misbehavior: i32,
    banned: bool,
}

/// Registry of known peers keyed by `"ip:port"`.
#[derive(Default)]
pub struct PeerRegistry {
    peers: HashMap<String, PeerEntry>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a peer and mark it connected.
    pub fn connect(&mut self, peer_id: &str) {
        let entry = self.peers.entry(peer_id.to_string()).or_default();
        entry.connected = true;
    }

    /// Mark a peer disconnected, keeping its score.
    pub fn disconnect(&mut self, peer_id: &str) {
        if let Some(entry) = self.peers.get_mut(peer_id) {
            entry.connected = false;
        }
    }

    /// Increase a peer's misbehavior score. Returns `true` when the peer
    /// crossed the ban threshold as a result.
    pub fn penalize(&mut self, peer_id: &str, score: i32, reason: &str) -> bool {
        let entry = self.peers.entry(peer_id.to_string()).or_default();
        entry.misbehavior += score;
        debug!(peer = peer_id, score = entry.misbehavior, reason, "peer penalized");

        if !entry.banned && entry.misbehavior >= BAN_THRESHOLD {
            entry.banned = true;
            entry.connected = false;
            warn!(peer = peer_id, reason, "peer banned for misbehavior");
            return true;
        }
        false
    }

    pub fn is_banned(&self, peer_id: &str) -> bool {
        self.peers.get(peer_id).is_some_and(|p| p.banned)
    }

    pub fn misbehavior(&self, peer_id: &str) -> i32 {
        self.peers.get(peer_id).map(|p| p.misbehavior).unwrap_or(0)
    }

    /// Ids of all connected, not-banned peers.
    pub fn connected_peers(&self) -> Vec<String> {
        self.peers
            .iter()
            .filter(|(_, p)| p.connected && !p.banned)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn connected_count(&self) -> usize {
        self.peers.values().filter(|p| p.connected && !p.banned).count()
    }
}
