//! Per-chain client wiring.
//!
//! [`ChainClient`] bundles one chain's observer state, batch signer and inbound
//! backlog with their collaborators, and exposes the bodies of the periodic
//! tasks an external scheduler drives:
//! - [`ChainClient::keysign_tick`] on every ledger block event,
//! - [`ChainClient::backlog_tick`] on the inbound tracker interval,
//! - [`ChainClient::record_scanned_block`] / [`ChainClient::record_scanned_tx`]
//!   after each successful scan,
//! - [`ChainClient::handle_monitoring_error`] for every posted inbound vote.

pub mod chain_client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod tasks;

pub use chain_client::{ChainClient, Collaborators};
pub use config::{ClientConfig, LoggingConfig, ObserverConfig, SignerConfig};
pub use error::ClientError;
pub use metrics::ClientMetrics;
pub use tasks::KeysignTick;
