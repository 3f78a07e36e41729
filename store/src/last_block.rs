//! Scan-progress storage trait.

use crate::StoreError;
use xchain_types::ChainId;

/// Key-value store of per-chain scan progress: the last fully scanned block
/// and, for chains scanned by transaction, the last scanned tx hash.
pub trait LastBlockStore: Send + Sync {
    /// Persist `block` as the last scanned block of `chain_id`.
    fn write_last_block(&self, chain_id: ChainId, block: u64) -> Result<(), StoreError>;

    /// Read the last scanned block. Returns [`StoreError::NotFound`] if
    /// nothing was ever written for this chain.
    fn read_last_block(&self, chain_id: ChainId) -> Result<u64, StoreError>;

    /// Persist `tx_hash` as the last scanned transaction of `chain_id`.
    fn write_last_tx(&self, chain_id: ChainId, tx_hash: &str) -> Result<(), StoreError>;

    /// Read the last scanned transaction. Returns [`StoreError::NotFound`]
    /// if nothing was ever written for this chain.
    fn read_last_tx(&self, chain_id: ChainId) -> Result<String, StoreError>;
}
