use itc_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),
}

impl From<heed::Error> for LmdbError {
    fn from(err: heed::Error) -> Self {
        LmdbError::Heed(err.to_string())
    }
}

impl From<LmdbError> for StoreError {
    fn from(err: LmdbError) -> Self {
        StoreError::Backend(err.to_string())
    }
}
