//! Shared utilities for the cross-chain client.

pub mod clock;
pub mod logging;
pub mod math;
pub mod retry;

pub use clock::{Clock, SystemClock};
pub use logging::{init_logging, LogFormat};
pub use math::{cantor_pair, cantor_unpair, MathError};
pub use retry::retry_constant;
