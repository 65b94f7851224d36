//! Double-SHA256 hashing for operation fingerprints and token ids.

use sha2::{Digest, Sha256};

/// Compute SHA-256d (SHA-256 applied twice) of arbitrary data.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut output = [0u8; 32];
    output.copy_from_slice(&second);
    output
}

/// SHA-256d over multiple byte slices in sequence (avoids concatenation
/// allocation).
pub fn sha256d_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let first = hasher.finalize();
    let second = Sha256::digest(first);
    let mut output = [0u8; 32];
    output.copy_from_slice(&second);
    output
}
