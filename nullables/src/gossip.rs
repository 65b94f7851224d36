//! Recording gossip sink for testing.

use std::sync::Mutex;

use itc_token_ledger::TokenGossip;

/// Captures every broadcast payload instead of touching the network.
#[derive(Default)]
pub struct NullGossip {
    broadcasts: Mutex<Vec<Vec<u8>>>,
}

impl NullGossip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broadcasts(&self) -> Vec<Vec<u8>> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().unwrap().len()
    }
}

impl TokenGossip for NullGossip {
    fn broadcast_operation(&self, payload: &[u8]) {
        self.broadcasts.lock().unwrap().push(payload.to_vec());
    }
}
