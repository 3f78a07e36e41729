//! Threshold-signature signer contract and signature caching.
//!
//! - [`KeysignBackend`]: the raw keysign protocol (run by co-signers together).
//! - [`TssSigner`]: what the batch signer consumes; adds the "already signed?" predicate.
//! - [`CachedTssSigner`]: a [`TssSigner`] that fronts a backend with a [`SignatureCache`].

pub mod cache;
pub mod error;
pub mod pubkey;
pub mod signer;

pub use cache::SignatureCache;
pub use error::TssError;
pub use pubkey::TssPubKey;
pub use signer::{CachedTssSigner, KeysignBackend, TssSigner};
