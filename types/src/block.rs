//! The minimal block model the token scanner consumes.
//!
//! The chain itself lives outside this workspace; blocks reach the token
//! subsystem through the `ChainView` seam already assembled. Only the
//! pieces the OP_RETURN scanner needs are modelled: transactions in block
//! order, outputs in transaction order.

use crate::amount::Amount;

/// A connected block, reduced to its transaction outputs.
#[derive(Clone, Debug, Default)]
pub struct Block {
    pub transactions: Vec<BlockTransaction>,
}

/// A transaction within a block.
#[derive(Clone, Debug, Default)]
pub struct BlockTransaction {
    pub outputs: Vec<TxOutput>,
}

/// A single transaction output.
#[derive(Clone, Debug)]
pub struct TxOutput {
    pub value: Amount,
    pub script_pubkey: Vec<u8>,
}

impl Block {
    /// Iterate every output in block order: transaction order first,
    /// output order within each transaction.
    pub fn outputs(&self) -> impl Iterator<Item = &TxOutput> {
        self.transactions.iter().flat_map(|tx| tx.outputs.iter())
    }
}
