//! Confirmation-depth arithmetic.
//!
//! A block `b` has `c` confirmations once the chain tip `l` satisfies
//! `l >= b + c - 1`, i.e. the block itself counts as the first confirmation.
//! All arithmetic is exact integer math and saturates instead of wrapping.

use xchain_types::ConfirmationMode;

/// Half-open range `[from, end)` of blocks that still need scanning.
///
/// At most `block_limit` blocks are returned. When nothing is confirmed yet
/// the range is empty and reported as `(last_scanned + 1, last_scanned + 1)`,
/// so `from` is always the next block to scan.
pub fn calc_unscanned_range(
    last_block: u64,
    last_scanned: u64,
    confirmation: u64,
    block_limit: u64,
) -> (u64, u64) {
    let next = last_scanned.saturating_add(1);
    if (last_block as u128) < last_scanned as u128 + confirmation as u128 {
        return (next, next);
    }

    // last_block >= last_scanned + confirmation, so this cannot underflow.
    let highest_confirmed = last_block as u128 + 1 - confirmation as u128;
    let end = (next as u128 + block_limit as u128).min(highest_confirmed + 1);
    let end = u64::try_from(end).unwrap_or(u64::MAX);
    (next, end)
}

/// True iff `last_block >= block + confirmation - 1`.
pub fn is_confirmed(block: u64, confirmation: u64, last_block: u64) -> bool {
    last_block as u128 + 1 >= block as u128 + confirmation as u128
}

/// Effective fast confirmation count: a fast count of `0` falls back to `safe_count`.
pub fn resolve_fast_confirmation(fast_count: u64, safe_count: u64) -> u64 {
    if fast_count == 0 {
        safe_count
    } else {
        fast_count
    }
}

/// Mode of a block already known to be at least fast-confirmed.
pub fn determine_inbound_mode(scanned_block: u64, last_block: u64, safe_count: u64) -> ConfirmationMode {
    if is_confirmed(scanned_block, safe_count, last_block) {
        ConfirmationMode::Safe
    } else {
        ConfirmationMode::Fast
    }
}
