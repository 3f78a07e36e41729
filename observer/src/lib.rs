//! Observer base shared by every per-chain observer.
//!
//! - [`confirmation`]: pure confirmation-depth and scan-range arithmetic.
//! - [`ObserverState`]: last observed / last scanned heights and chain params.
//! - [`InboundBacklog`]: failed inbound votes retried until finalized.

pub mod backlog;
pub mod confirmation;
pub mod error;
pub mod state;

pub use backlog::{BacklogConfig, InboundBacklog, MonitorOutcome};
pub use confirmation::{
    calc_unscanned_range, determine_inbound_mode, is_confirmed, resolve_fast_confirmation,
};
pub use error::ObserverError;
pub use state::{scan_from_block_env_var, scan_from_tx_env_var, ObserverState};
