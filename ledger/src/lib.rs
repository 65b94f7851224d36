//! Token ledger core for the ITC node.
//!
//! An in-process ledger that layers fungible tokens on top of the chain by
//! embedding signed operations into coinbase-spend outputs, gossiping them
//! peer to peer, and replaying them deterministically from blocks. The
//! ledger owns balances, allowances, supply, metadata, and history; the
//! chain, wallet, key store, and transport are consumed through the seams
//! in [`traits`].

pub mod error;
pub mod ledger;
pub mod operation;
pub mod script;
pub mod state;
pub mod token_id;
pub mod traits;
pub mod verify;

pub use error::LedgerError;
pub use ledger::TokenLedger;
pub use operation::{TokenOp, TokenOperation};
pub use state::{AllowanceKey, LedgerState, TokenMeta, WalletSigners, SCHEMA_VERSION};
pub use token_id::{generate_token_id, is_valid_token_id};
pub use traits::{ChainView, KeyStore, KeyStoreError, Recipient, TokenGossip, WalletError, WalletService};
