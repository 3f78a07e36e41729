use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TssError {
    #[error("keysign failed: {0}")]
    Keysign(String),

    #[error("digest/signature length mismatch: {digests} digests, {signatures} signatures")]
    LengthMismatch { digests: usize, signatures: usize },

    #[error("signature cache size must be non-zero")]
    InvalidCacheSize,
}
