//! Per-chain observer state.
//!
//! Both height counters only move forward: concurrent writers race through
//! `fetch_max`, so a late writer carrying a smaller height is a no-op. A
//! `last_block_scanned` of `0` means "not loaded; start from the latest block".
//!
//! Chains scanned by transaction instead of by block (e.g. Solana, TON) keep a
//! last scanned tx hash next to the counters; `None` leaves the start point
//! to the concrete observer.

use crate::confirmation::{
    calc_unscanned_range, determine_inbound_mode, is_confirmed, resolve_fast_confirmation,
};
use crate::ObserverError;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use xchain_store::LastBlockStore;
use xchain_types::{Chain, ChainId, ChainParams, ConfirmationMode, ConfirmationParams};

/// Environment variable overriding where scanning starts for `chain_id`.
pub fn scan_from_block_env_var(chain_id: ChainId) -> String {
    format!("CHAIN_{}_SCAN_FROM_BLOCK", chain_id)
}

/// Environment variable overriding the transaction scanning starts from.
pub fn scan_from_tx_env_var(chain_id: ChainId) -> String {
    format!("CHAIN_{}_SCAN_FROM_TX", chain_id)
}

const SCAN_FROM_LATEST: &str = "latest";

pub struct ObserverState {
    chain: Chain,
    chain_params: RwLock<ChainParams>,
    tss_address: String,
    last_block: AtomicU64,
    last_block_scanned: AtomicU64,
    last_tx_scanned: RwLock<Option<String>>,
    store: Arc<dyn LastBlockStore>,
}

impl ObserverState {
    pub fn new(
        chain: Chain,
        chain_params: ChainParams,
        tss_address: impl Into<String>,
        store: Arc<dyn LastBlockStore>,
    ) -> Self {
        Self {
            chain,
            chain_params: RwLock::new(chain_params),
            tss_address: tss_address.into(),
            last_block: AtomicU64::new(0),
            last_block_scanned: AtomicU64::new(0),
            last_tx_scanned: RwLock::new(None),
            store,
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain.chain_id
    }

    pub fn chain_params(&self) -> ChainParams {
        self.chain_params.read().clone()
    }

    /// Replace the chain params. Unchanged params are a silent no-op.
    pub fn set_chain_params(&self, params: ChainParams) {
        let mut current = self.chain_params.write();
        if *current == params {
            return;
        }
        tracing::info!(chain = %self.chain.chain_id, params = ?params, "updated chain params");
        *current = params;
    }

    pub fn confirmation_params(&self) -> ConfirmationParams {
        self.chain_params.read().confirmation_params
    }

    // ── Heights ──────────────────────────────────────────────────────────

    pub fn last_block(&self) -> u64 {
        self.last_block.load(Ordering::Acquire)
    }

    /// Raise the observed chain tip. Returns the height now stored.
    pub fn set_last_block(&self, block: u64) -> u64 {
        self.last_block.fetch_max(block, Ordering::AcqRel).max(block)
    }

    pub fn last_block_scanned(&self) -> u64 {
        self.last_block_scanned.load(Ordering::Acquire)
    }

    /// Raise the last scanned height in memory only. Returns the height now stored.
    pub fn set_last_block_scanned(&self, block: u64) -> u64 {
        let stored = self
            .last_block_scanned
            .fetch_max(block, Ordering::AcqRel)
            .max(block);
        tracing::debug!(chain = %self.chain.chain_id, block = stored, "last scanned block");
        stored
    }

    /// Record `block` as scanned in memory and persist it.
    pub fn save_last_block_scanned(&self, block: u64) -> Result<(), ObserverError> {
        let stored = self.set_last_block_scanned(block);
        self.store.write_last_block(self.chain.chain_id, stored)?;
        Ok(())
    }

    /// Load the scan start point from `CHAIN_<id>_SCAN_FROM_BLOCK`, falling
    /// back to the persisted store.
    pub fn load_last_block_scanned(&self) -> Result<(), ObserverError> {
        let var = scan_from_block_env_var(self.chain.chain_id);
        let value = std::env::var(&var).ok();
        self.load_last_block_scanned_with(&var, value.as_deref())
    }

    fn load_last_block_scanned_with(
        &self,
        var: &str,
        env_value: Option<&str>,
    ) -> Result<(), ObserverError> {
        let chain_id = self.chain.chain_id;
        if let Some(value) = env_value {
            let value = value.trim();
            if value == SCAN_FROM_LATEST {
                tracing::info!(chain = %chain_id, "scan override: starting from latest block");
                return Ok(());
            }
            let block = value
                .parse::<u64>()
                .map_err(|_| ObserverError::InvalidScanOverride {
                    var: var.to_string(),
                    value: value.to_string(),
                })?;
            self.set_last_block_scanned(block);
            tracing::info!(chain = %chain_id, block, "scan override: starting from configured block");
            return Ok(());
        }

        match self.store.read_last_block(chain_id) {
            Ok(block) => {
                self.set_last_block_scanned(block);
                tracing::info!(chain = %chain_id, block, "resuming from persisted last scanned block");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(chain = %chain_id, "no persisted scan progress; starting from latest block");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    // ── Transaction cursor ───────────────────────────────────────────────

    pub fn last_tx_scanned(&self) -> Option<String> {
        self.last_tx_scanned.read().clone()
    }

    /// Set the last scanned tx in memory only.
    pub fn set_last_tx_scanned(&self, tx_hash: &str) {
        let mut current = self.last_tx_scanned.write();
        if current.is_none() {
            tracing::info!(chain = %self.chain.chain_id, tx = tx_hash, "initializing last tx scanned");
        }
        *current = Some(tx_hash.to_owned());
    }

    /// Record `tx_hash` as scanned and persist it. `block` is the height or
    /// slot holding the tx; it only raises the in-memory scanned counter.
    pub fn save_last_tx_scanned(&self, tx_hash: &str, block: u64) -> Result<(), ObserverError> {
        self.set_last_tx_scanned(tx_hash);
        self.set_last_block_scanned(block);
        self.store.write_last_tx(self.chain.chain_id, tx_hash)?;
        Ok(())
    }

    /// Load the scan start tx from `CHAIN_<id>_SCAN_FROM_TX`, falling back to
    /// the persisted store.
    pub fn load_last_tx_scanned(&self) -> Result<(), ObserverError> {
        let var = scan_from_tx_env_var(self.chain.chain_id);
        let value = std::env::var(&var).ok();
        self.load_last_tx_scanned_with(value.as_deref())
    }

    fn load_last_tx_scanned_with(&self, env_value: Option<&str>) -> Result<(), ObserverError> {
        let chain_id = self.chain.chain_id;
        if let Some(tx) = env_value.map(str::trim).filter(|v| !v.is_empty()) {
            tracing::info!(chain = %chain_id, tx, "scan override: starting from configured tx");
            self.set_last_tx_scanned(tx);
            return Ok(());
        }

        match self.store.read_last_tx(chain_id) {
            Ok(tx) => {
                self.set_last_tx_scanned(&tx);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(chain = %chain_id, "no persisted last scanned tx");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    // ── Confirmation ─────────────────────────────────────────────────────

    /// Next inbound range under the safe confirmation count.
    pub fn scan_range_inbound_safe(&self, block_limit: u64) -> (u64, u64) {
        let confirmation = self.confirmation_params().safe_inbound_count;
        calc_unscanned_range(
            self.last_block(),
            self.last_block_scanned(),
            confirmation,
            block_limit,
        )
    }

    /// Next inbound range under the fast confirmation count.
    pub fn scan_range_inbound_fast(&self, block_limit: u64) -> (u64, u64) {
        let params = self.confirmation_params();
        let confirmation =
            resolve_fast_confirmation(params.fast_inbound_count, params.safe_inbound_count);
        calc_unscanned_range(
            self.last_block(),
            self.last_block_scanned(),
            confirmation,
            block_limit,
        )
    }

    pub fn is_block_confirmed_for_inbound_safe(&self, block: u64) -> bool {
        is_confirmed(
            block,
            self.confirmation_params().safe_inbound_count,
            self.last_block(),
        )
    }

    pub fn is_block_confirmed_for_inbound_fast(&self, block: u64) -> bool {
        let params = self.confirmation_params();
        let confirmation =
            resolve_fast_confirmation(params.fast_inbound_count, params.safe_inbound_count);
        is_confirmed(block, confirmation, self.last_block())
    }

    pub fn is_block_confirmed_for_outbound_safe(&self, block: u64) -> bool {
        is_confirmed(
            block,
            self.confirmation_params().safe_outbound_count,
            self.last_block(),
        )
    }

    pub fn is_block_confirmed_for_outbound_fast(&self, block: u64) -> bool {
        let params = self.confirmation_params();
        let confirmation =
            resolve_fast_confirmation(params.fast_outbound_count, params.safe_outbound_count);
        is_confirmed(block, confirmation, self.last_block())
    }

    /// Fast inbound confirmation is on only when it is strictly quicker than safe.
    pub fn is_fast_inbound_enabled(&self) -> bool {
        let params = self.confirmation_params();
        params.fast_inbound_count > 0 && params.fast_inbound_count < params.safe_inbound_count
    }

    /// Mode of an inbound block that already passed the fast check.
    pub fn inbound_mode(&self, scanned_block: u64) -> ConfirmationMode {
        determine_inbound_mode(
            scanned_block,
            self.last_block(),
            self.confirmation_params().safe_inbound_count,
        )
    }

    /// Identifier of an outbound: `<chain_id>-<tss_address>-<nonce>`.
    pub fn outbound_id(&self, nonce: u64) -> String {
        format!("{}-{}-{}", self.chain.chain_id, self.tss_address, nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xchain_nullables::NullLastBlockStore;

    const CHAIN: i64 = 1;

    fn params(safe_in: u64, fast_in: u64, safe_out: u64, fast_out: u64) -> ChainParams {
        ChainParams::new(
            ChainId::new(CHAIN),
            ConfirmationParams {
                safe_inbound_count: safe_in,
                fast_inbound_count: fast_in,
                safe_outbound_count: safe_out,
                fast_outbound_count: fast_out,
            },
        )
    }

    fn state_with(store: Arc<NullLastBlockStore>, p: ChainParams) -> ObserverState {
        ObserverState::new(Chain::new(CHAIN, "ethereum"), p, "0xtss", store)
    }

    fn state(p: ChainParams) -> ObserverState {
        state_with(Arc::new(NullLastBlockStore::new()), p)
    }

    #[test]
    fn heights_never_decrease() {
        let s = state(params(10, 0, 10, 0));
        assert_eq!(s.set_last_block(100), 100);
        assert_eq!(s.set_last_block(90), 100);
        assert_eq!(s.last_block(), 100);

        s.set_last_block_scanned(50);
        s.set_last_block_scanned(40);
        assert_eq!(s.last_block_scanned(), 50);
    }

    #[test]
    fn concurrent_writers_keep_the_maximum() {
        let s = Arc::new(state(params(10, 0, 10, 0)));
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let s = s.clone();
                std::thread::spawn(move || {
                    for i in 0..1_000u64 {
                        s.set_last_block(t * 1_000 + i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(s.last_block(), 7_999);
    }

    #[test]
    fn scan_ranges_use_confirmation_params() {
        let s = state(params(10, 2, 10, 0));
        s.set_last_block(100);
        s.set_last_block_scanned(90);
        assert_eq!(s.scan_range_inbound_safe(10), (91, 92));
        assert_eq!(s.scan_range_inbound_fast(10), (91, 100));
    }

    #[test]
    fn fast_disabled_falls_back_to_safe() {
        let s = state(params(10, 0, 12, 0));
        s.set_last_block(100);
        s.set_last_block_scanned(90);
        assert_eq!(s.scan_range_inbound_fast(10), s.scan_range_inbound_safe(10));
        assert!(!s.is_fast_inbound_enabled());
        assert!(s.is_block_confirmed_for_outbound_fast(89));
        assert!(!s.is_block_confirmed_for_outbound_fast(90));
    }

    #[test]
    fn fast_equal_to_safe_is_not_enabled() {
        assert!(!state(params(10, 10, 10, 10)).is_fast_inbound_enabled());
        assert!(state(params(10, 3, 10, 10)).is_fast_inbound_enabled());
    }

    #[test]
    fn block_confirmation_checks() {
        let s = state(params(2, 1, 3, 2));
        s.set_last_block(101);
        assert!(s.is_block_confirmed_for_inbound_safe(100));
        assert!(!s.is_block_confirmed_for_inbound_safe(101));
        assert!(s.is_block_confirmed_for_inbound_fast(101));
        assert!(s.is_block_confirmed_for_outbound_safe(99));
        assert!(!s.is_block_confirmed_for_outbound_safe(100));
        assert!(s.is_block_confirmed_for_outbound_fast(100));
        assert_eq!(s.inbound_mode(100), ConfirmationMode::Safe);
        assert_eq!(s.inbound_mode(101), ConfirmationMode::Fast);
    }

    #[test]
    fn set_chain_params_replaces_only_on_change() {
        let s = state(params(10, 0, 10, 0));
        s.set_chain_params(params(10, 0, 10, 0));
        assert_eq!(s.confirmation_params().safe_inbound_count, 10);
        s.set_chain_params(params(20, 5, 10, 0));
        assert_eq!(s.confirmation_params().safe_inbound_count, 20);
        assert_eq!(s.confirmation_params().fast_inbound_count, 5);
    }

    #[test]
    fn env_override_block_number() {
        let store = Arc::new(NullLastBlockStore::with_block(ChainId::new(CHAIN), 500));
        let s = state_with(store, params(10, 0, 10, 0));
        s.load_last_block_scanned_with("CHAIN_1_SCAN_FROM_BLOCK", Some("1234"))
            .unwrap();
        assert_eq!(s.last_block_scanned(), 1234);
    }

    #[test]
    fn env_override_latest_ignores_store() {
        let store = Arc::new(NullLastBlockStore::with_block(ChainId::new(CHAIN), 500));
        let s = state_with(store, params(10, 0, 10, 0));
        s.load_last_block_scanned_with("CHAIN_1_SCAN_FROM_BLOCK", Some("latest"))
            .unwrap();
        assert_eq!(s.last_block_scanned(), 0);
    }

    #[test]
    fn env_override_garbage_is_an_error() {
        let s = state(params(10, 0, 10, 0));
        let err = s
            .load_last_block_scanned_with("CHAIN_1_SCAN_FROM_BLOCK", Some("12ab"))
            .unwrap_err();
        assert!(matches!(err, ObserverError::InvalidScanOverride { .. }));
    }

    #[test]
    fn falls_back_to_store_then_latest() {
        let store = Arc::new(NullLastBlockStore::with_block(ChainId::new(CHAIN), 500));
        let s = state_with(store, params(10, 0, 10, 0));
        s.load_last_block_scanned_with("CHAIN_1_SCAN_FROM_BLOCK", None)
            .unwrap();
        assert_eq!(s.last_block_scanned(), 500);

        let empty = state(params(10, 0, 10, 0));
        empty
            .load_last_block_scanned_with("CHAIN_1_SCAN_FROM_BLOCK", None)
            .unwrap();
        assert_eq!(empty.last_block_scanned(), 0);
    }

    #[test]
    fn save_persists_to_store() {
        let store = Arc::new(NullLastBlockStore::new());
        let s = state_with(store.clone(), params(10, 0, 10, 0));
        s.save_last_block_scanned(77).unwrap();
        assert_eq!(s.last_block_scanned(), 77);
        assert_eq!(store.read_last_block(ChainId::new(CHAIN)).unwrap(), 77);
    }

    #[test]
    fn save_failure_is_reported() {
        let store = Arc::new(NullLastBlockStore::new());
        store.fail_writes(true);
        let s = state_with(store, params(10, 0, 10, 0));
        assert!(matches!(
            s.save_last_block_scanned(5),
            Err(ObserverError::Store(_))
        ));
    }

    #[test]
    fn tx_cursor_env_override_beats_store() {
        let store = Arc::new(NullLastBlockStore::with_tx(ChainId::new(CHAIN), "stored"));
        let s = state_with(store, params(10, 0, 10, 0));
        s.load_last_tx_scanned_with(Some("override")).unwrap();
        assert_eq!(s.last_tx_scanned().as_deref(), Some("override"));
    }

    #[test]
    fn tx_cursor_blank_override_falls_back_to_store() {
        let store = Arc::new(NullLastBlockStore::with_tx(ChainId::new(CHAIN), "stored"));
        let s = state_with(store, params(10, 0, 10, 0));
        s.load_last_tx_scanned_with(Some("  ")).unwrap();
        assert_eq!(s.last_tx_scanned().as_deref(), Some("stored"));
    }

    #[test]
    fn tx_cursor_absent_everywhere_stays_unset() {
        let s = state(params(10, 0, 10, 0));
        s.load_last_tx_scanned_with(None).unwrap();
        assert_eq!(s.last_tx_scanned(), None);
    }

    #[test]
    fn save_tx_persists_hash_and_raises_scanned_block() {
        let store = Arc::new(NullLastBlockStore::new());
        let s = state_with(store.clone(), params(10, 0, 10, 0));
        s.save_last_tx_scanned("tx-1", 300).unwrap();
        s.save_last_tx_scanned("tx-2", 250).unwrap();

        assert_eq!(s.last_tx_scanned().as_deref(), Some("tx-2"));
        assert_eq!(s.last_block_scanned(), 300);
        assert_eq!(store.read_last_tx(ChainId::new(CHAIN)).unwrap(), "tx-2");
        // Only the tx hash is persisted.
        assert!(store.read_last_block(ChainId::new(CHAIN)).unwrap_err().is_not_found());
    }

    #[test]
    fn save_tx_failure_is_reported() {
        let store = Arc::new(NullLastBlockStore::new());
        store.fail_writes(true);
        let s = state_with(store, params(10, 0, 10, 0));
        assert!(matches!(
            s.save_last_tx_scanned("tx-1", 1),
            Err(ObserverError::Store(_))
        ));
    }

    #[test]
    fn env_var_name_and_outbound_id() {
        assert_eq!(scan_from_tx_env_var(ChainId::new(900)), "CHAIN_900_SCAN_FROM_TX");
        assert_eq!(
            scan_from_block_env_var(ChainId::new(56)),
            "CHAIN_56_SCAN_FROM_BLOCK"
        );
        assert_eq!(state(params(1, 0, 1, 0)).outbound_id(7), "1-0xtss-7");
    }
}
