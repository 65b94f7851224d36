//! Seams to the subsystems the token ledger consumes but does not own.
//!
//! The chain, the wallet, key storage, and the gossip transport all live
//! outside this crate. The ledger is handed one capability per concern at
//! construction time; tests swap in the in-memory implementations from
//! `itc-nullables`.

use thiserror::Error;

use itc_types::{Amount, Block};

/// Read-only view of the canonical chain.
pub trait ChainView: Send + Sync {
    /// Height of the current chain tip.
    fn current_height(&self) -> i64;

    /// Read the block at the given height, if it exists on the active chain.
    fn read_block(&self, height: i64) -> Option<Block>;
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet not found: {0}")]
    WalletNotFound(String),

    #[error("failed to create transaction: {0}")]
    TransactionFailed(String),
}

/// A transaction output requested from the wallet.
#[derive(Clone, Debug)]
pub struct Recipient {
    pub script_pubkey: Vec<u8>,
    pub value: Amount,
}

/// The wallet operations the ledger needs: settling governance fees and
/// committing record-keeping transactions.
pub trait WalletService: Send + Sync {
    /// Pay `fee` from the named wallet to the governance address.
    fn send_governance_fee(
        &self,
        wallet_name: &str,
        fee: Amount,
        governance_address: &str,
    ) -> Result<(), WalletError>;

    /// Build, sign, and commit a transaction paying the given recipient.
    fn create_and_commit_transaction(
        &self,
        wallet_name: &str,
        recipient: Recipient,
    ) -> Result<(), WalletError>;
}

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("unknown wallet: {0}")]
    UnknownWallet(String),

    #[error("address has no signable key: {0}")]
    UnknownAddress(String),
}

/// Access to wallet key material for message signing.
///
/// Verification does not go through this trait — signature blobs carry the
/// public key and are checked by `itc_crypto::verify_message`.
pub trait KeyStore: Send + Sync {
    /// All addresses the named wallet can sign for.
    fn wallet_addresses(&self, wallet_name: &str) -> Vec<String>;

    /// Sign `message` with the key behind `address` in the named wallet.
    fn sign_message(
        &self,
        wallet_name: &str,
        address: &str,
        message: &str,
    ) -> Result<String, KeyStoreError>;
}

/// Outbound gossip for token operations.
pub trait TokenGossip: Send + Sync {
    /// Push the serialized operation to every connected peer.
    fn broadcast_operation(&self, payload: &[u8]);
}
