use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] itc_token_ledger::LedgerError),

    #[error("network error: {0}")]
    Network(#[from] itc_network::NetworkError),

    #[error("store error: {0}")]
    Store(#[from] itc_store::StoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
