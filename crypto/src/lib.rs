//! Hashing, key generation, address derivation, and message signing for
//! the ITC token subsystem.

pub mod address;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::derive_address;
pub use hash::{sha256d, sha256d_multi};
pub use keys::{generate_keypair, keypair_from_seed};
pub use sign::{sign_message, verify_message, VerifyError};
