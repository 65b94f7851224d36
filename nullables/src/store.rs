//! In-memory key-value store for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use itc_store::{KvStore, StoreError};

/// A thread-safe in-memory store. Batches are applied atomically under
/// one lock, matching the durability contract shape of the LMDB backend.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    fail_writes: Mutex<bool>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, for exercising fatal-error paths.
    pub fn set_write_failure(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    /// Raw snapshot of an entry, for byte-level assertions.
    pub fn raw(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

impl KvStore for MemoryKvStore {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn write_batch(&self, entries: &[(&[u8], &[u8])], _sync: bool) -> Result<(), StoreError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(StoreError::Backend("write failure injected".to_string()));
        }
        let mut map = self.entries.lock().unwrap();
        for (key, value) in entries {
            map.insert(key.to_vec(), value.to_vec());
        }
        Ok(())
    }
}
