//! Inbound votes, trackers and the cross-chain transactions they finalize into.

use crate::chain::ChainId;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// Asset class moved by an inbound transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinType {
    Gas,
    Erc20,
    Zeta,
    NoAssetCall,
}

impl CoinType {
    fn tag(&self) -> u8 {
        match self {
            CoinType::Gas => 0,
            CoinType::Erc20 => 1,
            CoinType::Zeta => 2,
            CoinType::NoAssetCall => 3,
        }
    }
}

/// An observer's claim that an inbound transaction happened on an external chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundVote {
    pub sender: String,
    pub sender_chain_id: ChainId,
    pub receiver: String,
    pub receiver_chain_id: ChainId,
    pub amount: u128,
    pub message: String,
    pub inbound_hash: String,
    pub inbound_block_height: u64,
    pub coin_type: CoinType,
    pub asset: String,
    pub event_index: u64,
}

impl InboundVote {
    /// Deterministic ballot index: hex SHA-256 over the vote's identifying fields.
    ///
    /// Every honest observer derives the same index for the same inbound event.
    pub fn ballot_index(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sender.as_bytes());
        hasher.update([0]);
        hasher.update(self.sender_chain_id.get().to_be_bytes());
        hasher.update(self.receiver.as_bytes());
        hasher.update([0]);
        hasher.update(self.receiver_chain_id.get().to_be_bytes());
        hasher.update(self.amount.to_be_bytes());
        hasher.update(self.message.as_bytes());
        hasher.update([0]);
        hasher.update(self.inbound_hash.as_bytes());
        hasher.update([0]);
        hasher.update(self.inbound_block_height.to_be_bytes());
        hasher.update([self.coin_type.tag()]);
        hasher.update(self.asset.as_bytes());
        hasher.update([0]);
        hasher.update(self.event_index.to_be_bytes());
        hex::encode(hasher.finalize())
    }

    /// The tracker that asks the ledger to re-observe this vote's inbound transaction.
    pub fn inbound_tracker(&self) -> InboundTracker {
        InboundTracker {
            chain_id: self.sender_chain_id,
            tx_hash: self.inbound_hash.clone(),
            coin_type: self.coin_type,
        }
    }
}

/// Request to (re-)observe one inbound transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InboundTracker {
    pub chain_id: ChainId,
    pub tx_hash: String,
    pub coin_type: CoinType,
}

/// A finalized cross-chain transaction, indexed by the ballot that created it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainTx {
    pub index: String,
    pub sender_chain_id: ChainId,
    pub inbound_hash: String,
}

/// Failure report emitted by a vote-monitoring routine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorError {
    pub vote: InboundVote,
    pub vote_tx_hash: String,
    pub reason: String,
}
