use thiserror::Error;
use xchain_ledger::LedgerError;
use xchain_tss::TssError;

/// Batch collection outcomes that only mean "try again later".
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NotReady {
    #[error("waiting for digests")]
    WaitingForDigests,

    #[error("waiting for digests gaps")]
    WaitingForDigestGaps,

    #[error("waiting for digests until nonce {0}")]
    WaitingUntilNonce(u64),
}

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("batch not ready: {0}")]
    NotReady(#[from] NotReady),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("tss error: {0}")]
    Tss(#[from] TssError),

    #[error("invalid keysign height input: chain id {chain_id}, height {height}")]
    InvalidKeysignHeight { chain_id: i64, height: u64 },

    #[error("tss returned {got} signatures for {expected} digests")]
    SignatureCountMismatch { expected: usize, got: usize },
}

impl SignerError {
    /// Whether the condition clears up by itself on a later tick.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SignerError::NotReady(_) | SignerError::Ledger(_))
    }
}
