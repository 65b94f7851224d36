//! Monetary amounts in base units.
//!
//! Token balances and fees share the chain's base-unit representation:
//! a signed 64-bit integer. Negative amounts never appear in a valid
//! ledger; the sign exists so that arithmetic underflow is detectable
//! rather than wrapping.

/// An amount in base units (1 ITC = 100,000,000 base units).
pub type Amount = i64;

/// Base units per whole coin.
pub const COIN: Amount = 100_000_000;
