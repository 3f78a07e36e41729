//! Remote ledger client contract.
//!
//! Observers and signers never talk to the ledger's RPC directly; they hold an
//! `Arc<dyn LedgerRepo>` so transports and test doubles are interchangeable.

pub mod error;
pub mod repo;

pub use error::LedgerError;
pub use repo::LedgerRepo;
