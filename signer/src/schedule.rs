//! When to run a keysign round.

use crate::SignerError;
use std::time::Duration;
use xchain_ledger::LedgerRepo;
use xchain_types::{BlockEvent, PendingNonces};
use xchain_utils::Clock;

/// Whether keysign should run at `ledger_height`.
///
/// Requires a non-zero `schedule_interval` dividing the height, at least one
/// pending nonce, and `next_tss_nonce` still inside the pending window. A TSS
/// nonce at or past `nonce_high` means the outbounds were already processed
/// on the external chain and only await confirmations.
pub fn is_time_to_keysign(
    pending: PendingNonces,
    next_tss_nonce: u64,
    ledger_height: u64,
    schedule_interval: u64,
) -> bool {
    if schedule_interval == 0 || ledger_height % schedule_interval != 0 {
        return false;
    }
    if pending.is_empty() {
        return false;
    }
    let nonce_high = u64::try_from(pending.nonce_high).unwrap_or(0);
    next_tss_nonce < nonce_high
}

/// Remaining part of `target` measured from the block time. Never negative.
pub fn keysign_delay(event: &BlockEvent, target: Duration, clock: &dyn Clock) -> Duration {
    event.time.saturating_add(target).remaining_from(clock.now())
}

/// Compare a block event against the real-time ledger height.
///
/// Returns `(ledger_height, true)` for an event older than the current
/// height (left over in the scheduler's queue). Otherwise sleeps the
/// remaining keysign delay and returns `(ledger_height, false)`.
pub async fn check_block_event(
    ledger: &dyn LedgerRepo,
    clock: &dyn Clock,
    event: &BlockEvent,
    target_delay: Duration,
) -> Result<(u64, bool), SignerError> {
    let ledger_height = ledger.get_block_height().await?;
    if event.height < ledger_height {
        tracing::info!(ledger_height, event_block = event.height, "stale block event");
        return Ok((ledger_height, true));
    }

    let delay = keysign_delay(event, target_delay, clock);
    if !delay.is_zero() {
        tracing::debug!(delay_ms = delay.as_millis() as u64, "applying keysign delay");
        tokio::time::sleep(delay).await;
    }
    Ok((ledger_height, false))
}
