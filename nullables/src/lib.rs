//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the observer/signer core (clock, ledger
//! RPC, scan-progress store, keysign protocol) is abstracted behind a trait.
//! This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (including injected failures)
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod keysign;
pub mod ledger;
pub mod store;

pub use clock::NullClock;
pub use keysign::{KeysignCall, NullKeysign};
pub use ledger::NullLedger;
pub use store::NullLastBlockStore;
