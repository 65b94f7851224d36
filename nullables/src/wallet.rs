//! In-memory wallet service for testing.

use std::sync::Mutex;

use itc_token_ledger::{Recipient, WalletError, WalletService};
use itc_types::Amount;

/// Records every fee settlement and committed transaction; both can be
/// forced to fail to exercise the soft-failure paths.
#[derive(Default)]
pub struct NullWallet {
    fees: Mutex<Vec<(String, Amount, String)>>,
    committed: Mutex<Vec<(String, Recipient)>>,
    fail_fees: Mutex<bool>,
    fail_commits: Mutex<bool>,
}

impl NullWallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fee_failure(&self, fail: bool) {
        *self.fail_fees.lock().unwrap() = fail;
    }

    pub fn set_commit_failure(&self, fail: bool) {
        *self.fail_commits.lock().unwrap() = fail;
    }

    /// Every settled fee as `(wallet, amount, governance_address)`.
    pub fn fees_sent(&self) -> Vec<(String, Amount, String)> {
        self.fees.lock().unwrap().clone()
    }

    /// Every committed record transaction as `(wallet, recipient)`.
    pub fn committed(&self) -> Vec<(String, Recipient)> {
        self.committed.lock().unwrap().clone()
    }
}

impl WalletService for NullWallet {
    fn send_governance_fee(
        &self,
        wallet_name: &str,
        fee: Amount,
        governance_address: &str,
    ) -> Result<(), WalletError> {
        if *self.fail_fees.lock().unwrap() {
            return Err(WalletError::TransactionFailed("fee failure injected".to_string()));
        }
        self.fees.lock().unwrap().push((
            wallet_name.to_string(),
            fee,
            governance_address.to_string(),
        ));
        Ok(())
    }

    fn create_and_commit_transaction(
        &self,
        wallet_name: &str,
        recipient: Recipient,
    ) -> Result<(), WalletError> {
        if *self.fail_commits.lock().unwrap() {
            return Err(WalletError::TransactionFailed("commit failure injected".to_string()));
        }
        self.committed
            .lock()
            .unwrap()
            .push((wallet_name.to_string(), recipient));
        Ok(())
    }
}
