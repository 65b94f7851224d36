//! Chain-event follower: drives the ledger from block connects and
//! disconnects.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use itc_token_ledger::{LedgerError, TokenLedger};
use itc_types::Block;

/// One event from the chain's validation interface.
#[derive(Clone, Debug)]
pub enum ChainEvent {
    /// A block was connected to the active chain at `height`.
    Connected { block: Block, height: i64 },
    /// The block at `height` was disconnected (reorg).
    Disconnected { height: i64 },
}

/// Subscribes to the chain-event stream and feeds the token ledger.
pub struct ChainFollower {
    ledger: Arc<TokenLedger>,
}

impl ChainFollower {
    pub fn new(ledger: Arc<TokenLedger>) -> Self {
        Self { ledger }
    }

    /// Apply one chain event to the ledger.
    ///
    /// Connects scan the block for embedded operations; disconnects
    /// trigger a bounded rescan from the disconnect height.
    pub fn handle_event(&self, event: &ChainEvent) -> Result<(), LedgerError> {
        match event {
            ChainEvent::Connected { block, height } => self.ledger.process_block(block, *height),
            ChainEvent::Disconnected { height } => {
                info!(height, "block disconnected, rescanning token state");
                self.ledger.rescan_from_height(*height)
            }
        }
    }

    /// Drain the event channel until it closes.
    ///
    /// A ledger error is fatal: the loop stops so no further operations
    /// are processed against a store that cannot persist.
    pub async fn run(self, mut events: mpsc::Receiver<ChainEvent>) -> Result<(), LedgerError> {
        while let Some(event) = events.recv().await {
            self.handle_event(&event)?;
        }
        Ok(())
    }
}
