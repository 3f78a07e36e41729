//! JSON-file backend for [`LastBlockStore`].
//!
//! All chains share one file holding a
//! `{ "<chain_id>": { "block": n, "tx": "hash" } }` object; either field may
//! be absent.
//! Writes go to a sibling temp file which is then renamed over the original.

use crate::{LastBlockStore, StoreError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use xchain_types::ChainId;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ChainProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tx: Option<String>,
}

type ProgressMap = BTreeMap<String, ChainProgress>;

pub struct FileLastBlockStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl FileLastBlockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<ProgressMap, StoreError> {
        if !self.path.exists() {
            return Ok(ProgressMap::new());
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| StoreError::Backend(e.to_string()))?;
        if content.trim().is_empty() {
            return Ok(ProgressMap::new());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn persist(&self, map: &ProgressMap) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::Backend(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::Backend(e.to_string()))
    }
}

impl LastBlockStore for FileLastBlockStore {
    fn write_last_block(&self, chain_id: ChainId, block: u64) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut map = self.load()?;
        map.entry(chain_id.to_string()).or_default().block = Some(block);
        self.persist(&map)?;
        tracing::debug!(chain = %chain_id, block, "persisted last scanned block");
        Ok(())
    }

    fn read_last_block(&self, chain_id: ChainId) -> Result<u64, StoreError> {
        let _guard = self.lock.lock();
        self.load()?
            .get(&chain_id.to_string())
            .and_then(|progress| progress.block)
            .ok_or_else(|| StoreError::NotFound(format!("last block of chain {chain_id}")))
    }

    fn write_last_tx(&self, chain_id: ChainId, tx_hash: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut map = self.load()?;
        map.entry(chain_id.to_string()).or_default().tx = Some(tx_hash.to_owned());
        self.persist(&map)?;
        tracing::debug!(chain = %chain_id, tx = tx_hash, "persisted last scanned tx");
        Ok(())
    }

    fn read_last_tx(&self, chain_id: ChainId) -> Result<String, StoreError> {
        let _guard = self.lock.lock();
        self.load()?
            .remove(&chain_id.to_string())
            .and_then(|progress| progress.tx)
            .ok_or_else(|| StoreError::NotFound(format!("last tx of chain {chain_id}")))
    }
}
