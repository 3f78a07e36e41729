//! Nullable ledger: scripted responses for [`LedgerRepo`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use xchain_ledger::{LedgerError, LedgerRepo};
use xchain_types::{ChainId, CrossChainTx, InboundTracker, PendingNonces};

/// An in-memory ledger. Unset pending nonces read as the empty window `[0, 0)`.
pub struct NullLedger {
    operator: String,
    block_height: AtomicU64,
    pending: Mutex<HashMap<ChainId, PendingNonces>>,
    fail_pending: AtomicBool,
    cctxs: Mutex<HashMap<String, CrossChainTx>>,
    failing_ballots: Mutex<HashSet<String>>,
    trackers: Mutex<HashMap<ChainId, Vec<InboundTracker>>>,
    fail_trackers: AtomicBool,
    votes: Mutex<HashSet<(String, String)>>,
    fail_has_voted: AtomicBool,
    pending_calls: AtomicUsize,
}

impl NullLedger {
    pub fn new(operator: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            block_height: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
            fail_pending: AtomicBool::new(false),
            cctxs: Mutex::new(HashMap::new()),
            failing_ballots: Mutex::new(HashSet::new()),
            trackers: Mutex::new(HashMap::new()),
            fail_trackers: AtomicBool::new(false),
            votes: Mutex::new(HashSet::new()),
            fail_has_voted: AtomicBool::new(false),
            pending_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_block_height(&self, height: u64) {
        self.block_height.store(height, Ordering::SeqCst);
    }

    pub fn set_pending_nonces(&self, chain_id: ChainId, nonce_low: i64, nonce_high: i64) {
        self.pending
            .lock()
            .insert(chain_id, PendingNonces::new(nonce_low, nonce_high));
    }

    pub fn fail_pending_nonces(&self, fail: bool) {
        self.fail_pending.store(fail, Ordering::SeqCst);
    }

    /// Number of `get_pending_nonces` calls served so far.
    pub fn pending_nonce_calls(&self) -> usize {
        self.pending_calls.load(Ordering::SeqCst)
    }

    /// Mark `ballot` as finalized into a cctx.
    pub fn add_cctx(&self, ballot: &str, cctx: CrossChainTx) {
        self.cctxs.lock().insert(ballot.to_string(), cctx);
    }

    /// Make lookups of `ballot` fail with an RPC error.
    pub fn fail_cctx_lookup(&self, ballot: &str) {
        self.failing_ballots.lock().insert(ballot.to_string());
    }

    pub fn set_trackers(&self, chain_id: ChainId, trackers: Vec<InboundTracker>) {
        self.trackers.lock().insert(chain_id, trackers);
    }

    pub fn fail_trackers(&self, fail: bool) {
        self.fail_trackers.store(fail, Ordering::SeqCst);
    }

    pub fn add_vote(&self, ballot: &str, voter: &str) {
        self.votes
            .lock()
            .insert((ballot.to_string(), voter.to_string()));
    }

    pub fn fail_has_voted(&self, fail: bool) {
        self.fail_has_voted.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerRepo for NullLedger {
    async fn get_pending_nonces(&self, chain_id: ChainId) -> Result<PendingNonces, LedgerError> {
        self.pending_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_pending.load(Ordering::SeqCst) {
            return Err(LedgerError::Rpc("pending nonces unavailable".into()));
        }
        Ok(self.pending.lock().get(&chain_id).copied().unwrap_or_default())
    }

    async fn get_cctx_by_hash(&self, ballot: &str) -> Result<Option<CrossChainTx>, LedgerError> {
        if self.failing_ballots.lock().contains(ballot) {
            return Err(LedgerError::Rpc(format!("cctx lookup failed for {ballot}")));
        }
        Ok(self.cctxs.lock().get(ballot).cloned())
    }

    async fn get_inbound_trackers_for_chain(
        &self,
        chain_id: ChainId,
    ) -> Result<Vec<InboundTracker>, LedgerError> {
        if self.fail_trackers.load(Ordering::SeqCst) {
            return Err(LedgerError::Rpc("trackers unavailable".into()));
        }
        Ok(self.trackers.lock().get(&chain_id).cloned().unwrap_or_default())
    }

    async fn has_voted(&self, ballot: &str, voter: &str) -> Result<bool, LedgerError> {
        if self.fail_has_voted.load(Ordering::SeqCst) {
            return Err(LedgerError::Rpc("has_voted unavailable".into()));
        }
        Ok(self
            .votes
            .lock()
            .contains(&(ballot.to_string(), voter.to_string())))
    }

    async fn get_block_height(&self) -> Result<u64, LedgerError> {
        Ok(self.block_height.load(Ordering::SeqCst))
    }

    fn operator_address(&self) -> String {
        self.operator.clone()
    }
}
