//! Address derivation from public keys.
//!
//! Both keyed address kinds encode the first 20 bytes of the SHA-256d
//! public-key hash as lowercase hex under the kind's prefix. The token
//! ledger never decodes addresses back to key hashes — verification
//! re-derives the address from the public key carried in the signature
//! blob and compares strings.

use itc_types::address::{LEGACY_PREFIX, WITNESS_PREFIX};
use itc_types::{AddressKind, PublicKey};

use crate::hash::sha256d;

/// Derive the address of the given kind for a public key.
pub fn derive_address(public: &PublicKey, kind: AddressKind) -> String {
    let key_hash = sha256d(public.as_bytes());
    let payload = hex::encode(&key_hash[..20]);
    match kind {
        AddressKind::Witness => format!("{WITNESS_PREFIX}{payload}"),
        AddressKind::Legacy => format!("{LEGACY_PREFIX}{payload}"),
    }
}
