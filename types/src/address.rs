//! Address classification for the two keyed address kinds.
//!
//! The token subsystem treats addresses as opaque strings; the only
//! structure it relies on is the kind prefix. Signers must be one of the
//! two single-key kinds — script-hash and other exotic destinations cannot
//! sign token operations.

use std::fmt;

/// Prefix of native-segwit single-key addresses.
pub const WITNESS_PREFIX: &str = "itc1";

/// Prefix of legacy pay-to-pubkey-hash addresses.
pub const LEGACY_PREFIX: &str = "1";

/// The kind of a keyed address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressKind {
    /// Legacy P2PKH-style address (`1…`).
    Legacy,
    /// Native-segwit single-key address (`itc1…`).
    Witness,
}

impl AddressKind {
    /// Classify an address string, or `None` when it is not a keyed kind.
    ///
    /// Witness addresses start with `itc1` followed by lowercase
    /// alphanumerics; legacy addresses start with `1` followed by
    /// alphanumerics. Both payloads must fall within sane length bounds.
    pub fn of(address: &str) -> Option<AddressKind> {
        if let Some(rest) = address.strip_prefix(WITNESS_PREFIX) {
            if payload_len_ok(rest) && rest.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
                return Some(AddressKind::Witness);
            }
            return None;
        }
        if let Some(rest) = address.strip_prefix(LEGACY_PREFIX) {
            if payload_len_ok(rest) && rest.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Some(AddressKind::Legacy);
            }
        }
        None
    }
}

fn payload_len_ok(payload: &str) -> bool {
    (20..=80).contains(&payload.len())
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressKind::Legacy => write!(f, "legacy"),
            AddressKind::Witness => write!(f, "witness"),
        }
    }
}
