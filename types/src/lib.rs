//! Fundamental types for the ITC token subsystem.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: address kinds, amounts, operation fingerprints, the minimal
//! block model the token scanner consumes, key material, and tunable
//! parameters.

pub mod address;
pub mod amount;
pub mod block;
pub mod hash;
pub mod keys;
pub mod params;

pub use address::AddressKind;
pub use amount::{Amount, COIN};
pub use block::{Block, BlockTransaction, TxOutput};
pub use hash::Fingerprint;
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use params::TokenParams;
