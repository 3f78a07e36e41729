//! Persistence for observer scan progress.
//!
//! Observers persist the highest block they have fully scanned per chain so a
//! restart resumes where it left off. Backends implement [`LastBlockStore`];
//! the rest of the codebase depends only on the trait.

pub mod error;
pub mod file;
pub mod last_block;

pub use error::StoreError;
pub use file::FileLastBlockStore;
pub use last_block::LastBlockStore;
