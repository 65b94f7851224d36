//! Nullable infrastructure for deterministic testing.
//!
//! The token ledger's external collaborators — chain, wallet, key store,
//! gossip, storage — are abstracted behind the traits in
//! `itc-token-ledger`. This crate provides test-friendly implementations
//! that return deterministic values, can be controlled programmatically,
//! and never touch the filesystem or network.
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod gossip;
pub mod keychain;
pub mod store;
pub mod wallet;

pub use chain::NullChain;
pub use gossip::NullGossip;
pub use keychain::NullKeychain;
pub use store::MemoryKvStore;
pub use wallet::NullWallet;
