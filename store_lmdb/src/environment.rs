//! LMDB environment holding the token ledger database.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use itc_store::{KvStore, StoreError};

use crate::LmdbError;

/// Default LMDB map size — the ledger blob stays far below this.
const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;

/// LMDB-backed key-value store for the token ledger.
pub struct LmdbTokenStore {
    env: Arc<Env>,
    db: Database<Bytes, Bytes>,
}

impl LmdbTokenStore {
    /// Open or create the environment at the given path.
    pub fn open(path: &Path) -> Result<Self, LmdbError> {
        Self::open_with_map_size(path, DEFAULT_MAP_SIZE)
    }

    /// Open with an explicit map size (exposed for tests).
    pub fn open_with_map_size(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Heed(format!("failed to create directory: {e}")))?;

        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(1)
                .map_size(map_size)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let db = env.create_database(&mut wtxn, Some("token_ledger"))?;
        wtxn.commit()?;

        Ok(Self {
            env: Arc::new(env),
            db,
        })
    }
}

impl KvStore for LmdbTokenStore {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let value = self.db.get(&rtxn, key).map_err(LmdbError::from)?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn write_batch(&self, entries: &[(&[u8], &[u8])], _sync: bool) -> Result<(), StoreError> {
        // LMDB write-transaction commits are durable: the environment is
        // opened without NOSYNC, so every commit fsyncs.
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        for &(key, value) in entries {
            self.db.put(&mut wtxn, key, value).map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
