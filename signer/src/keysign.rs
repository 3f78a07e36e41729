//! Per-nonce keysign state and nonce-contiguous batches.

use xchain_types::{Digest, Signature65};

/// Nonces per keysign batch.
pub const BATCH_SIZE: u64 = 10;

pub fn nonce_to_batch_number(nonce: u64) -> u64 {
    nonce / BATCH_SIZE
}

/// Inclusive nonce window `(low, high)` of batch `batch_number`.
pub fn batch_number_to_range(batch_number: u64) -> (u64, u64) {
    let low = batch_number * BATCH_SIZE;
    (low, low + BATCH_SIZE - 1)
}

/// Digest of one outbound nonce and, once signed, its signature.
///
/// Replacing the digest always clears the signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeysignInfo {
    pub cctx_height: u64,
    pub digest: Digest,
    pub signature: Option<Signature65>,
}

impl KeysignInfo {
    pub fn new(cctx_height: u64, digest: Digest) -> Self {
        Self {
            cctx_height,
            digest,
            signature: None,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some_and(|s| !s.is_empty())
    }
}

/// Digests of one batch window, ordered by nonce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeysignBatch {
    batch_number: u64,
    digests: Vec<Digest>,
    nonce_low: u64,
    nonce_high: u64,
    height_low: u64,
    height_high: u64,
}

impl KeysignBatch {
    pub fn new(batch_number: u64) -> Self {
        Self {
            batch_number,
            digests: Vec::new(),
            nonce_low: 0,
            nonce_high: 0,
            height_low: 0,
            height_high: 0,
        }
    }

    /// Append `info` for `nonce`. Nonces must be added in ascending order.
    pub fn add_keysign_info(&mut self, nonce: u64, info: &KeysignInfo) {
        if self.digests.is_empty() {
            self.nonce_low = nonce;
            self.height_low = info.cctx_height;
            self.height_high = info.cctx_height;
        } else {
            self.height_low = self.height_low.min(info.cctx_height);
            self.height_high = self.height_high.max(info.cctx_height);
        }
        self.nonce_high = nonce;
        self.digests.push(info.digest.clone());
    }

    pub fn batch_number(&self) -> u64 {
        self.batch_number
    }

    pub fn digests(&self) -> &[Digest] {
        &self.digests
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    pub fn nonce_low(&self) -> u64 {
        self.nonce_low
    }

    pub fn nonce_high(&self) -> u64 {
        self.nonce_high
    }

    pub fn height_low(&self) -> u64 {
        self.height_low
    }

    pub fn height_high(&self) -> u64 {
        self.height_high
    }

    /// True iff the batch has no gap: `nonce_high - nonce_low + 1 == len`.
    pub fn is_sequential(&self) -> bool {
        !self.is_empty() && self.nonce_high - self.nonce_low + 1 == self.digests.len() as u64
    }

    pub fn contains_nonce(&self, nonce: u64) -> bool {
        !self.is_empty() && self.nonce_low <= nonce && nonce <= self.nonce_high
    }

    /// True when the batch reaches the last nonce of its window.
    pub fn is_end(&self) -> bool {
        !self.is_empty() && self.nonce_high == batch_number_to_range(self.batch_number).1
    }
}
