//! Deterministic key store for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use itc_crypto::{derive_address, keypair_from_seed, sign_message};
use itc_token_ledger::{KeyStore, KeyStoreError};
use itc_types::{AddressKind, KeyPair};

/// An in-memory key store: named wallets, each holding seed-derived
/// Ed25519 keys. Every key can sign for both its witness and its legacy
/// address.
#[derive(Default)]
pub struct NullKeychain {
    wallets: Mutex<HashMap<String, Vec<KeyPair>>>,
}

impl NullKeychain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a wallet with a single seed-derived key. Returns the wallet's
    /// `(witness, legacy)` addresses.
    pub fn add_wallet(&self, name: &str, seed: u8) -> (String, String) {
        let key_pair = keypair_from_seed(&[seed; 32]);
        let witness = derive_address(&key_pair.public, AddressKind::Witness);
        let legacy = derive_address(&key_pair.public, AddressKind::Legacy);
        self.wallets
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push(key_pair);
        (witness, legacy)
    }

    /// The witness address of the wallet's first key, if the wallet exists.
    pub fn witness_address(&self, name: &str) -> Option<String> {
        self.wallets
            .lock()
            .unwrap()
            .get(name)?
            .first()
            .map(|kp| derive_address(&kp.public, AddressKind::Witness))
    }
}

impl KeyStore for NullKeychain {
    fn wallet_addresses(&self, wallet_name: &str) -> Vec<String> {
        let wallets = self.wallets.lock().unwrap();
        let Some(keys) = wallets.get(wallet_name) else {
            return Vec::new();
        };
        keys.iter()
            .flat_map(|kp| {
                [
                    derive_address(&kp.public, AddressKind::Witness),
                    derive_address(&kp.public, AddressKind::Legacy),
                ]
            })
            .collect()
    }

    fn sign_message(
        &self,
        wallet_name: &str,
        address: &str,
        message: &str,
    ) -> Result<String, KeyStoreError> {
        let wallets = self.wallets.lock().unwrap();
        let keys = wallets
            .get(wallet_name)
            .ok_or_else(|| KeyStoreError::UnknownWallet(wallet_name.to_string()))?;

        for key_pair in keys {
            let witness = derive_address(&key_pair.public, AddressKind::Witness);
            let legacy = derive_address(&key_pair.public, AddressKind::Legacy);
            if address == witness || address == legacy {
                return Ok(sign_message(message, key_pair));
            }
        }
        Err(KeyStoreError::UnknownAddress(address.to_string()))
    }
}
