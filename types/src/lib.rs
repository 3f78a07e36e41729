//! Fundamental types for the cross-chain client.
//!
//! This crate defines the value types shared across every other crate in the
//! workspace: chain identifiers and parameters, pending nonce windows, TSS
//! digests and signatures, inbound votes/trackers, and timestamps.

pub mod chain;
pub mod digest;
pub mod error;
pub mod event;
pub mod inbound;
pub mod nonce;
pub mod time;

pub use chain::{Chain, ChainId, ChainParams, ConfirmationMode, ConfirmationParams};
pub use digest::{Digest, Signature65};
pub use error::TypesError;
pub use event::BlockEvent;
pub use inbound::{CoinType, CrossChainTx, InboundTracker, InboundVote, MonitorError};
pub use nonce::PendingNonces;
pub use time::Timestamp;
