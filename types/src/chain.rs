//! Chain identity and per-chain observation parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identifier of an external chain, as registered on the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(i64);

impl ChainId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An observed chain: its id plus a human-readable name used in logs and metrics.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chain {
    pub chain_id: ChainId,
    pub name: String,
}

impl Chain {
    pub fn new(chain_id: i64, name: impl Into<String>) -> Self {
        Self {
            chain_id: ChainId::new(chain_id),
            name: name.into(),
        }
    }
}

/// Safe/fast confirmation counts for inbound and outbound observation.
///
/// A fast count of `0` means fast confirmation is disabled for that direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationParams {
    pub safe_inbound_count: u64,
    pub fast_inbound_count: u64,
    pub safe_outbound_count: u64,
    pub fast_outbound_count: u64,
}

/// Ledger-governed parameters for one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    pub chain_id: ChainId,
    pub confirmation_params: ConfirmationParams,
    /// Keysign is attempted only at ledger heights divisible by this interval.
    pub outbound_schedule_interval: u64,
}

impl ChainParams {
    pub fn new(chain_id: ChainId, confirmation_params: ConfirmationParams) -> Self {
        Self {
            chain_id,
            confirmation_params,
            outbound_schedule_interval: 1,
        }
    }
}

/// Which confirmation policy an inbound observation satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfirmationMode {
    Safe,
    Fast,
}

impl fmt::Display for ConfirmationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmationMode::Safe => write!(f, "safe"),
            ConfirmationMode::Fast => write!(f, "fast"),
        }
    }
}
