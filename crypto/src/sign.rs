//! Message signing and verification bound to an address.
//!
//! A signature blob is `hex(public_key ‖ ed25519_signature)` — 96 bytes,
//! 192 hex characters. Verification recovers the public key from the blob,
//! re-derives the address for the claimed address's kind, and only then
//! checks the Ed25519 signature over the message bytes.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use thiserror::Error;

use itc_types::{AddressKind, KeyPair};

use crate::address::derive_address;

/// Why a message signature failed to verify.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("address is not a keyed kind")]
    InvalidAddress,

    #[error("signature blob is malformed")]
    MalformedSignature,

    #[error("signing key does not match the address")]
    KeyMismatch,

    #[error("signature does not match the message")]
    BadSignature,
}

/// Sign a message with a key pair, returning the hex signature blob.
pub fn sign_message(message: &str, key_pair: &KeyPair) -> String {
    let signing_key = SigningKey::from_bytes(&key_pair.private.0);
    let signature = signing_key.sign(message.as_bytes());

    let mut blob = Vec::with_capacity(96);
    blob.extend_from_slice(key_pair.public.as_bytes());
    blob.extend_from_slice(&signature.to_bytes());
    hex::encode(blob)
}

/// Verify that `signature` was produced over `message` by the key behind
/// `address`.
pub fn verify_message(address: &str, signature: &str, message: &str) -> Result<(), VerifyError> {
    let kind = AddressKind::of(address).ok_or(VerifyError::InvalidAddress)?;

    let blob = hex::decode(signature).map_err(|_| VerifyError::MalformedSignature)?;
    if blob.len() != 96 {
        return Err(VerifyError::MalformedSignature);
    }

    let mut public_bytes = [0u8; 32];
    public_bytes.copy_from_slice(&blob[..32]);
    let mut sig_bytes = [0u8; 64];
    sig_bytes.copy_from_slice(&blob[32..]);

    let public = itc_types::PublicKey(public_bytes);
    if derive_address(&public, kind) != address {
        return Err(VerifyError::KeyMismatch);
    }

    let verifying_key =
        VerifyingKey::from_bytes(&public_bytes).map_err(|_| VerifyError::MalformedSignature)?;
    let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);
    verifying_key
        .verify(message.as_bytes(), &signature)
        .map_err(|_| VerifyError::BadSignature)
}
