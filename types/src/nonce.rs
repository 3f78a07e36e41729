//! Pending outbound nonce window reported by the ledger.

use serde::{Deserialize, Serialize};

/// Half-open window `[nonce_low, nonce_high)` of outbound nonces awaiting signing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNonces {
    pub nonce_low: i64,
    pub nonce_high: i64,
}

impl PendingNonces {
    pub fn new(nonce_low: i64, nonce_high: i64) -> Self {
        Self {
            nonce_low,
            nonce_high,
        }
    }

    /// True when no nonce is pending (`nonce_low >= nonce_high`).
    pub fn is_empty(&self) -> bool {
        self.nonce_low >= self.nonce_high
    }
}
