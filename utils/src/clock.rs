//! Time source abstraction.
//!
//! Components that reason about expiry or delays take an `Arc<dyn Clock>`
//! so tests can substitute a manually-advanced clock.

use xchain_types::Timestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
