use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("storage error: {0}")]
    Store(#[from] itc_store::StoreError),

    #[error("codec error: {0}")]
    Codec(#[from] itc_protocol::CodecError),

    #[error("token db schema version {0} is not supported")]
    UnsupportedSchema(u32),
}
