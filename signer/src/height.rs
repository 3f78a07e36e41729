//! Chain-disambiguated keysign heights.
//!
//! Co-signers key their keysign rounds by height. Two chains signing at the
//! same ledger height must not collide, so the round height is the Cantor
//! pairing of `(ledger_height, chain_id)`.

use crate::SignerError;
use xchain_types::ChainId;
use xchain_utils::cantor_pair;

/// Largest ledger height or chain id accepted for pairing. Keeps the
/// paired result far inside `u64`.
pub const MAX_PAIRING_INPUT: u64 = (1 << 31) - 1;

pub fn keysign_height(chain_id: ChainId, ledger_height: u64) -> Result<u64, SignerError> {
    let invalid = || SignerError::InvalidKeysignHeight {
        chain_id: chain_id.get(),
        height: ledger_height,
    };
    let id = u64::try_from(chain_id.get()).map_err(|_| invalid())?;
    if id == 0 || id > MAX_PAIRING_INPUT || ledger_height > MAX_PAIRING_INPUT {
        return Err(invalid());
    }
    cantor_pair(ledger_height, id).map_err(|_| invalid())
}
