//! In-memory chain view for testing.

use std::collections::BTreeMap;
use std::sync::Mutex;

use itc_token_ledger::script::op_return_script;
use itc_token_ledger::{ChainView, TokenOperation};
use itc_types::params::DUST_MARKER;
use itc_types::{Block, BlockTransaction, TxOutput};

/// A controllable chain: blocks keyed by height, trimmable to simulate
/// reorgs.
#[derive(Default)]
pub struct NullChain {
    blocks: Mutex<BTreeMap<i64, Block>>,
}

impl NullChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a block at the given height, extending the tip.
    pub fn push_block(&self, height: i64, block: Block) {
        self.blocks.lock().unwrap().insert(height, block);
    }

    /// Drop every block at or above `height`, as a disconnect would.
    pub fn truncate_from(&self, height: i64) {
        self.blocks.lock().unwrap().retain(|&h, _| h < height);
    }

    /// Build a block whose outputs embed the given operations, one
    /// OP_RETURN output per operation plus an unrelated payment output.
    pub fn block_with_ops(ops: &[TokenOperation]) -> Block {
        let mut outputs: Vec<TxOutput> = ops
            .iter()
            .map(|op| TxOutput {
                value: DUST_MARKER,
                script_pubkey: op_return_script(&op.to_wire_bytes()),
            })
            .collect();
        outputs.push(TxOutput {
            value: 50 * itc_types::COIN,
            script_pubkey: vec![0x76, 0xa9, 0x14],
        });
        Block {
            transactions: vec![BlockTransaction { outputs }],
        }
    }
}

impl ChainView for NullChain {
    fn current_height(&self) -> i64 {
        self.blocks
            .lock()
            .unwrap()
            .keys()
            .next_back()
            .copied()
            .unwrap_or(0)
    }

    fn read_block(&self, height: i64) -> Option<Block> {
        self.blocks.lock().unwrap().get(&height).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tip_follows_pushes_and_truncation() {
        let chain = NullChain::new();
        assert_eq!(chain.current_height(), 0);

        chain.push_block(5, Block::default());
        chain.push_block(6, Block::default());
        assert_eq!(chain.current_height(), 6);

        chain.truncate_from(6);
        assert_eq!(chain.current_height(), 5);
        assert!(chain.read_block(6).is_none());
    }
}
