//! The key-value surface the token ledger persists through.

use crate::StoreError;

/// A minimal embedded key-value store.
///
/// The ledger keeps its whole state under two short keys, so the trait is
/// deliberately tiny: point reads plus an atomic multi-key write.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write all entries atomically. When `sync` is set the write must be
    /// durable before returning.
    fn write_batch(&self, entries: &[(&[u8], &[u8])], sync: bool) -> Result<(), StoreError>;
}
