//! LMDB storage backend for the ITC token subsystem.
//!
//! Implements the `itc-store` trait using the `heed` LMDB bindings. The
//! token ledger's snapshot blob and schema version live in a single LMDB
//! database within one environment.

pub mod environment;
pub mod error;

pub use environment::LmdbTokenStore;
pub use error::LmdbError;
