use crate::LedgerError;
use async_trait::async_trait;
use xchain_types::{ChainId, CrossChainTx, InboundTracker, PendingNonces};

/// Read-only view of the ledger needed by the observer/signer core.
#[async_trait]
pub trait LedgerRepo: Send + Sync {
    /// Pending outbound nonce window `[nonce_low, nonce_high)` for `chain_id`.
    async fn get_pending_nonces(&self, chain_id: ChainId) -> Result<PendingNonces, LedgerError>;

    /// The cctx created by `ballot`, or `None` if the ballot is not finalized yet.
    ///
    /// An `Err` means the status could not be determined.
    async fn get_cctx_by_hash(&self, ballot: &str) -> Result<Option<CrossChainTx>, LedgerError>;

    /// Inbound trackers the ledger currently holds for `chain_id`.
    async fn get_inbound_trackers_for_chain(
        &self,
        chain_id: ChainId,
    ) -> Result<Vec<InboundTracker>, LedgerError>;

    /// Whether `voter` already voted on `ballot`.
    async fn has_voted(&self, ballot: &str, voter: &str) -> Result<bool, LedgerError>;

    /// Current ledger block height.
    async fn get_block_height(&self) -> Result<u64, LedgerError>;

    /// Address this client votes with.
    fn operator_address(&self) -> String;
}
