use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("ledger error: {0}")]
    Ledger(#[from] itc_token_ledger::LedgerError),
}
