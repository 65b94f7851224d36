//! Ed25519 key generation.

use ed25519_dalek::SigningKey;
use itc_types::{KeyPair, PrivateKey, PublicKey};

/// Generate a new Ed25519 key pair from a secure random source.
pub fn generate_keypair() -> KeyPair {
    let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
    keypair_from_signing_key(signing_key)
}

/// Derive a key pair deterministically from a 32-byte seed.
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    keypair_from_signing_key(SigningKey::from_bytes(seed))
}

fn keypair_from_signing_key(signing_key: SigningKey) -> KeyPair {
    let public = PublicKey(signing_key.verifying_key().to_bytes());
    let private = PrivateKey(signing_key.to_bytes());
    KeyPair { public, private }
}
