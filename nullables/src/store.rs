//! Nullable scan-progress store: in-memory and thread-safe.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use xchain_store::{LastBlockStore, StoreError};
use xchain_types::ChainId;

#[derive(Default)]
pub struct NullLastBlockStore {
    blocks: Mutex<HashMap<ChainId, u64>>,
    txs: Mutex<HashMap<ChainId, String>>,
    fail_writes: AtomicBool,
}

impl NullLastBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(chain_id: ChainId, block: u64) -> Self {
        let store = Self::new();
        store.blocks.lock().insert(chain_id, block);
        store
    }

    pub fn with_tx(chain_id: ChainId, tx_hash: &str) -> Self {
        let store = Self::new();
        store.txs.lock().insert(chain_id, tx_hash.to_owned());
        store
    }

    /// Make every subsequent write fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl LastBlockStore for NullLastBlockStore {
    fn write_last_block(&self, chain_id: ChainId, block: u64) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write disabled".into()));
        }
        self.blocks.lock().insert(chain_id, block);
        Ok(())
    }

    fn read_last_block(&self, chain_id: ChainId) -> Result<u64, StoreError> {
        self.blocks
            .lock()
            .get(&chain_id)
            .copied()
            .ok_or_else(|| StoreError::NotFound(format!("last block of chain {chain_id}")))
    }

    fn write_last_tx(&self, chain_id: ChainId, tx_hash: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write disabled".into()));
        }
        self.txs.lock().insert(chain_id, tx_hash.to_owned());
        Ok(())
    }

    fn read_last_tx(&self, chain_id: ChainId) -> Result<String, StoreError> {
        self.txs
            .lock()
            .get(&chain_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("last tx of chain {chain_id}")))
    }
}
