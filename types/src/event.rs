//! Block events delivered by the scheduler to block-triggered tasks.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// A new ledger block, as announced to a block-triggered task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEvent {
    pub height: u64,
    pub time: Timestamp,
}

impl BlockEvent {
    pub fn new(height: u64, time: Timestamp) -> Self {
        Self { height, time }
    }
}
