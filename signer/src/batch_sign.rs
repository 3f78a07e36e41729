//! TSS batch keysign coordinator.
//!
//! Per nonce a [`KeysignInfo`] moves through three states:
//!
//! ```text
//! no digest ──add──▶ digest pending ──sign_batch──▶ signed
//!                         ▲                          │
//!                         └────── digest changed ────┘
//! ```
//!
//! Signed nonces below the ledger's lowest pending nonce are pruned with
//! [`BatchSigner::remove_keysign_info`].

use crate::error::{NotReady, SignerError};
use crate::height::keysign_height;
use crate::keysign::{batch_number_to_range, KeysignBatch, KeysignInfo};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use xchain_ledger::LedgerRepo;
use xchain_tss::TssSigner;
use xchain_types::{Chain, ChainId, Digest, Signature65};
use xchain_utils::retry_constant;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchSignerConfig {
    /// Pause between two collection attempts of the same batch.
    pub collect_batch_backoff: Duration,
    /// Extra collection attempts after the first one.
    pub collect_batch_retries: usize,
}

impl Default for BatchSignerConfig {
    fn default() -> Self {
        Self {
            collect_batch_backoff: Duration::from_secs(4),
            collect_batch_retries: 2,
        }
    }
}

/// Outcome of looking up one batch window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchStatus {
    /// Nothing to sign yet in this window, or the batch is incomplete.
    NotReady,
    /// Complete batch whose signatures the TSS signer already holds.
    Signed(KeysignBatch),
    /// Complete batch awaiting a keysign round.
    Unsigned(KeysignBatch),
}

pub struct BatchSigner {
    chain: Chain,
    tss: Arc<dyn TssSigner>,
    ledger: Arc<dyn LedgerRepo>,
    config: BatchSignerConfig,
    infos: RwLock<BTreeMap<u64, KeysignInfo>>,
}

impl BatchSigner {
    pub fn new(
        chain: Chain,
        tss: Arc<dyn TssSigner>,
        ledger: Arc<dyn LedgerRepo>,
        config: BatchSignerConfig,
    ) -> Self {
        Self {
            chain,
            tss,
            ledger,
            config,
            infos: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain.chain_id
    }

    pub fn tss(&self) -> &Arc<dyn TssSigner> {
        &self.tss
    }

    /// Number of nonces currently holding a digest.
    pub fn pending_digests(&self) -> usize {
        self.infos.read().len()
    }

    /// Signature cached for `nonce` if it was signed over exactly `digest`.
    ///
    /// An unknown nonce is registered with `digest`. A known nonce with a
    /// different digest (e.g. after a gas price bump) gets the new digest and
    /// loses its signature. Both cases return `None`.
    pub fn get_signature_or_add_digest(
        &self,
        nonce: u64,
        cctx_height: u64,
        digest: Digest,
    ) -> Option<Signature65> {
        let mut infos = self.infos.write();
        match infos.get_mut(&nonce) {
            None => {
                tracing::info!(chain = %self.chain.chain_id, nonce, digest = %digest, "added digest to cache");
                infos.insert(nonce, KeysignInfo::new(cctx_height, digest));
                None
            }
            Some(info) if info.digest != digest => {
                tracing::info!(
                    chain = %self.chain.chain_id,
                    nonce,
                    digest = %digest,
                    old_digest = %info.digest,
                    "updated digest in cache"
                );
                info.digest = digest;
                info.cctx_height = cctx_height;
                info.signature = None;
                None
            }
            Some(info) => info.signature.filter(|s| !s.is_empty()),
        }
    }

    /// `Some(until_nonce)` if batch `batch_number` overlaps the ledger's
    /// pending window; `until_nonce` is the last pending nonce inside the batch.
    pub async fn is_batch_ready_to_sign(&self, batch_number: u64) -> Result<Option<u64>, SignerError> {
        let pending = self.ledger.get_pending_nonces(self.chain.chain_id).await?;
        if pending.is_empty() {
            tracing::info!(
                chain = %self.chain.chain_id,
                batch_num = batch_number,
                nonce_low = pending.nonce_low,
                nonce_high = pending.nonce_high,
                "no pending cctx to sign"
            );
            return Ok(None);
        }

        // Non-empty, so nonce_high >= 1.
        let cctx_low = u64::try_from(pending.nonce_low).unwrap_or(0);
        let cctx_high = u64::try_from(pending.nonce_high - 1).unwrap_or(0);
        let (batch_low, batch_high) = batch_number_to_range(batch_number);

        let overlap = cctx_low <= batch_high && batch_low <= cctx_high;
        if !overlap {
            tracing::info!(
                chain = %self.chain.chain_id,
                batch_num = batch_number,
                nonce_low = pending.nonce_low,
                nonce_high = pending.nonce_high,
                "batch is not ready to sign"
            );
            return Ok(None);
        }
        Ok(Some(cctx_high.min(batch_high)))
    }

    /// Collect the digests of batch `batch_number` up to `until_nonce`.
    pub fn collect_keysign_batch(
        &self,
        batch_number: u64,
        until_nonce: u64,
    ) -> Result<KeysignBatch, NotReady> {
        let (low, high) = batch_number_to_range(batch_number);
        let mut batch = KeysignBatch::new(batch_number);
        {
            let infos = self.infos.read();
            for (nonce, info) in infos.range(low..=high) {
                batch.add_keysign_info(*nonce, info);
            }
        }

        if batch.is_empty() {
            Err(NotReady::WaitingForDigests)
        } else if !batch.is_sequential() {
            Err(NotReady::WaitingForDigestGaps)
        } else if !batch.contains_nonce(until_nonce) {
            Err(NotReady::WaitingUntilNonce(until_nonce))
        } else {
            Ok(batch)
        }
    }

    /// Readiness check, then bounded constant-backoff collection.
    pub async fn keysign_batch_status(&self, batch_number: u64) -> BatchStatus {
        let until_nonce = match self.is_batch_ready_to_sign(batch_number).await {
            Ok(Some(until)) => until,
            Ok(None) => return BatchStatus::NotReady,
            Err(e) => {
                tracing::error!(chain = %self.chain.chain_id, batch_num = batch_number, error = %e, "unable to check batch readiness");
                return BatchStatus::NotReady;
            }
        };

        let collected = retry_constant(
            self.config.collect_batch_retries,
            self.config.collect_batch_backoff,
            |_| true,
            || async move { self.collect_keysign_batch(batch_number, until_nonce) },
        )
        .await;

        match collected {
            Ok(batch) if self.is_batch_signed(&batch) => BatchStatus::Signed(batch),
            Ok(batch) => BatchStatus::Unsigned(batch),
            Err(reason) => {
                tracing::info!(chain = %self.chain.chain_id, batch_num = batch_number, reason = %reason, "unable to collect keysign batch");
                BatchStatus::NotReady
            }
        }
    }

    /// The batch to sign for `batch_number`, or `None` if it is already
    /// signed or not ready.
    pub async fn get_keysign_batch(&self, batch_number: u64) -> Option<KeysignBatch> {
        match self.keysign_batch_status(batch_number).await {
            BatchStatus::Unsigned(batch) => Some(batch),
            BatchStatus::Signed(_) | BatchStatus::NotReady => None,
        }
    }

    pub fn is_batch_signed(&self, batch: &KeysignBatch) -> bool {
        self.tss.is_signature_cached(self.chain.chain_id, batch.digests())
    }

    /// Run one TSS round over `batch` and attach the signatures.
    ///
    /// Any failure leaves every nonce of the batch unsigned.
    pub async fn sign_batch(&self, batch: &KeysignBatch, ledger_height: u64) -> Result<(), SignerError> {
        let chain_id = self.chain.chain_id;
        let keysign_height = keysign_height(chain_id, ledger_height)?;
        tracing::info!(
            chain = %chain_id,
            batch_num = batch.batch_number(),
            nonce_low = batch.nonce_low(),
            nonce_high = batch.nonce_high(),
            height = ledger_height,
            keysign_height,
            "signing batch of digests"
        );

        let signatures = match self
            .tss
            .sign_batch(batch.digests(), keysign_height, batch.nonce_high(), chain_id)
            .await
        {
            Ok(signatures) => signatures,
            Err(e) => {
                tracing::error!(chain = %chain_id, batch_num = batch.batch_number(), error = %e, "batch keysign failed");
                return Err(e.into());
            }
        };
        if signatures.len() != batch.len() {
            return Err(SignerError::SignatureCountMismatch {
                expected: batch.len(),
                got: signatures.len(),
            });
        }

        self.add_batch_signatures(batch, &signatures);
        tracing::info!(chain = %chain_id, batch_num = batch.batch_number(), "signed batch of digests");
        Ok(())
    }

    /// Attach `signatures[nonce - nonce_low]` to each nonce of `batch`,
    /// skipping nonces whose digest changed after the batch was collected.
    pub fn add_batch_signatures(&self, batch: &KeysignBatch, signatures: &[Signature65]) {
        let mut infos = self.infos.write();
        for (idx, nonce) in (batch.nonce_low()..=batch.nonce_high()).enumerate() {
            let (Some(info), Some(digest), Some(signature)) =
                (infos.get_mut(&nonce), batch.digests().get(idx), signatures.get(idx))
            else {
                continue;
            };
            if info.digest != *digest {
                tracing::info!(chain = %self.chain.chain_id, batch_num = batch.batch_number(), nonce, "skipping signature");
                continue;
            }
            info.signature = Some(*signature);
            tracing::info!(chain = %self.chain.chain_id, batch_num = batch.batch_number(), nonce, "added signature to cache");
        }
    }

    /// Drop every nonce below `before_nonce`. Returns how many were dropped.
    pub fn remove_keysign_info(&self, before_nonce: u64) -> usize {
        let mut infos = self.infos.write();
        let kept = infos.split_off(&before_nonce);
        let removed = infos.len();
        *infos = kept;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xchain_nullables::{NullKeysign, NullLedger};
    use xchain_tss::{CachedTssSigner, SignatureCache};
    use xchain_utils::SystemClock;

    const CHAIN: i64 = 1;

    struct Harness {
        ledger: Arc<NullLedger>,
        tss: Arc<CachedTssSigner<NullKeysign>>,
        signer: BatchSigner,
    }

    fn harness() -> Harness {
        harness_with(BatchSignerConfig {
            collect_batch_backoff: Duration::from_millis(1),
            collect_batch_retries: 2,
        })
    }

    fn harness_with(config: BatchSignerConfig) -> Harness {
        let ledger = Arc::new(NullLedger::new("zeta1operator"));
        let cache = SignatureCache::new(1_000, Duration::from_secs(600), Arc::new(SystemClock)).unwrap();
        let tss = Arc::new(CachedTssSigner::new(NullKeysign::new(), cache));
        let signer = BatchSigner::new(Chain::new(CHAIN, "ethereum"), tss.clone(), ledger.clone(), config);
        Harness { ledger, tss, signer }
    }

    fn digest(nonce: u64) -> Digest {
        Digest::new(vec![nonce as u8; 32])
    }

    fn add_digests(signer: &BatchSigner, nonces: impl IntoIterator<Item = u64>) {
        for n in nonces {
            assert_eq!(signer.get_signature_or_add_digest(n, 100 + n, digest(n)), None);
        }
    }

    #[tokio::test]
    async fn batch_ready_and_collected() {
        let h = harness();
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 0, 5);
        add_digests(&h.signer, 0..5);

        let batch = h.signer.get_keysign_batch(0).await.expect("batch ready");
        assert_eq!(batch.len(), 5);
        assert_eq!((batch.nonce_low(), batch.nonce_high()), (0, 4));
        assert_eq!((batch.height_low(), batch.height_high()), (100, 104));
        assert!(!batch.is_end());
    }

    #[tokio::test]
    async fn no_overlap_with_pending_window() {
        let h = harness();
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 0, 9);
        add_digests(&h.signer, 0..9);
        assert_eq!(h.signer.is_batch_ready_to_sign(1).await.unwrap(), None);
        assert!(h.signer.get_keysign_batch(1).await.is_none());
    }

    #[tokio::test]
    async fn no_pending_cctx() {
        let h = harness();
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 5, 5);
        add_digests(&h.signer, 0..5);
        assert!(h.signer.get_keysign_batch(0).await.is_none());
    }

    #[tokio::test]
    async fn until_nonce_is_capped_by_batch_window() {
        let h = harness();
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 3, 25);
        assert_eq!(h.signer.is_batch_ready_to_sign(0).await.unwrap(), Some(9));
        assert_eq!(h.signer.is_batch_ready_to_sign(2).await.unwrap(), Some(24));
        assert_eq!(h.signer.is_batch_ready_to_sign(3).await.unwrap(), None);
    }

    #[tokio::test]
    async fn waiting_for_digests() {
        let h = harness();
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 0, 5);
        assert_eq!(
            h.signer.collect_keysign_batch(0, 4),
            Err(NotReady::WaitingForDigests)
        );
        assert!(h.signer.get_keysign_batch(0).await.is_none());
    }

    #[tokio::test]
    async fn gap_in_digests_is_not_ready() {
        let h = harness();
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 5, 10);
        add_digests(&h.signer, [0, 1, 2, 4]);
        assert_eq!(
            h.signer.collect_keysign_batch(0, 9),
            Err(NotReady::WaitingForDigestGaps)
        );
        assert!(h.signer.get_keysign_batch(0).await.is_none());
    }

    #[tokio::test]
    async fn waiting_until_nonce() {
        let h = harness();
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 0, 5);
        add_digests(&h.signer, 0..3);
        assert_eq!(
            h.signer.collect_keysign_batch(0, 4),
            Err(NotReady::WaitingUntilNonce(4))
        );
        assert!(h.signer.get_keysign_batch(0).await.is_none());
    }

    #[tokio::test]
    async fn pending_nonce_rpc_failure_is_not_ready() {
        let h = harness();
        h.ledger.fail_pending_nonces(true);
        add_digests(&h.signer, 0..5);
        assert_eq!(h.signer.keysign_batch_status(0).await, BatchStatus::NotReady);
    }

    fn backoff_config(retries: usize) -> BatchSignerConfig {
        BatchSignerConfig {
            collect_batch_backoff: Duration::from_secs(4),
            collect_batch_retries: retries,
        }
    }

    /// Status of batch 0 while the last digest (nonce 4) lands `after` the
    /// first collection attempt.
    async fn status_with_late_digest(h: &Harness, after: Duration) -> BatchStatus {
        let fill = async {
            tokio::time::sleep(after).await;
            h.signer.get_signature_or_add_digest(4, 104, digest(4));
        };
        let (status, _) = tokio::join!(h.signer.keysign_batch_status(0), fill);
        status
    }

    #[tokio::test(start_paused = true)]
    async fn late_digest_is_picked_up_by_retry() {
        let h = harness_with(backoff_config(2));
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 0, 5);
        add_digests(&h.signer, 0..4);

        let start = tokio::time::Instant::now();
        match status_with_late_digest(&h, Duration::from_secs(1)).await {
            BatchStatus::Unsigned(batch) => assert_eq!(batch.len(), 5),
            other => panic!("expected unsigned batch, got {other:?}"),
        }
        // First attempt failed, the second after one backoff succeeded.
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn without_retries_late_digest_is_missed() {
        let h = harness_with(backoff_config(0));
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 0, 5);
        add_digests(&h.signer, 0..4);

        let start = tokio::time::Instant::now();
        assert_eq!(
            status_with_late_digest(&h, Duration::from_secs(1)).await,
            BatchStatus::NotReady
        );
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        assert!(matches!(h.signer.keysign_batch_status(0).await, BatchStatus::Unsigned(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn collection_gives_up_after_retries_plus_one_attempts() {
        let h = harness_with(backoff_config(2));
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 0, 5);
        add_digests(&h.signer, 0..4);

        let start = tokio::time::Instant::now();
        assert_eq!(h.signer.keysign_batch_status(0).await, BatchStatus::NotReady);
        // Three attempts separated by two backoffs.
        assert_eq!(start.elapsed(), Duration::from_secs(8));
        assert_eq!(h.ledger.pending_nonce_calls(), 1);
    }

    #[tokio::test]
    async fn sign_batch_attaches_signatures() {
        let h = harness();
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 0, 5);
        add_digests(&h.signer, 0..5);

        let batch = h.signer.get_keysign_batch(0).await.unwrap();
        h.signer.sign_batch(&batch, 100).await.unwrap();

        for n in 0..5 {
            let sig = h.signer.get_signature_or_add_digest(n, 100 + n, digest(n));
            assert_eq!(sig, Some(NullKeysign::signature_for(&digest(n))));
        }
        let calls = h.tss.backend().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].nonce, 4);
        assert_eq!(calls[0].keysign_height, keysign_height(ChainId::new(CHAIN), 100).unwrap());
        assert!(h.signer.is_batch_signed(&batch));
    }

    #[tokio::test]
    async fn signed_batch_is_reported_and_not_returned() {
        let h = harness();
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 0, 5);
        add_digests(&h.signer, 0..5);
        let batch = h.signer.get_keysign_batch(0).await.unwrap();
        h.signer.sign_batch(&batch, 100).await.unwrap();

        assert_eq!(h.signer.keysign_batch_status(0).await, BatchStatus::Signed(batch));
        assert!(h.signer.get_keysign_batch(0).await.is_none());
    }

    #[tokio::test]
    async fn changed_digest_clears_signature() {
        let h = harness();
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 0, 5);
        add_digests(&h.signer, 0..5);
        let batch = h.signer.get_keysign_batch(0).await.unwrap();
        h.signer.sign_batch(&batch, 100).await.unwrap();

        assert!(h.signer.get_signature_or_add_digest(2, 102, digest(2)).is_some());
        let bumped = Digest::new(vec![0xee; 32]);
        assert_eq!(h.signer.get_signature_or_add_digest(2, 102, bumped.clone()), None);
        assert_eq!(h.signer.get_signature_or_add_digest(2, 102, bumped), None);
        assert!(h.signer.get_signature_or_add_digest(3, 103, digest(3)).is_some());
    }

    #[tokio::test]
    async fn stale_signature_is_not_attached() {
        let h = harness();
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 0, 5);
        add_digests(&h.signer, 0..5);
        let batch = h.signer.get_keysign_batch(0).await.unwrap();

        // Gas price bump between collection and signing.
        let bumped = Digest::new(vec![0xee; 32]);
        h.signer.get_signature_or_add_digest(1, 101, bumped.clone());
        h.signer.sign_batch(&batch, 100).await.unwrap();

        assert_eq!(h.signer.get_signature_or_add_digest(1, 101, bumped), None);
        assert!(h.signer.get_signature_or_add_digest(0, 100, digest(0)).is_some());
        assert!(h.signer.get_signature_or_add_digest(2, 102, digest(2)).is_some());
    }

    #[tokio::test]
    async fn failed_keysign_leaves_batch_unsigned() {
        let h = harness();
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 0, 5);
        add_digests(&h.signer, 0..5);
        let batch = h.signer.get_keysign_batch(0).await.unwrap();

        h.tss.backend().pause(true);
        let err = h.signer.sign_batch(&batch, 100).await.unwrap_err();
        assert!(matches!(err, SignerError::Tss(_)));
        assert!(!err.is_retryable());
        for n in 0..5 {
            assert_eq!(h.signer.get_signature_or_add_digest(n, 100 + n, digest(n)), None);
        }
        assert!(!h.signer.is_batch_signed(&batch));
    }

    #[tokio::test]
    async fn invalid_keysign_height_is_a_hard_error() {
        let h = harness();
        h.ledger.set_pending_nonces(ChainId::new(CHAIN), 0, 1);
        add_digests(&h.signer, 0..1);
        let batch = h.signer.get_keysign_batch(0).await.unwrap();
        let err = h.signer.sign_batch(&batch, 1 << 40).await.unwrap_err();
        assert!(matches!(err, SignerError::InvalidKeysignHeight { .. }));
        assert!(h.tss.backend().calls().is_empty());
    }

    #[test]
    fn add_batch_signatures_ignores_unknown_nonces() {
        let h = harness();
        add_digests(&h.signer, 0..3);
        let mut batch = KeysignBatch::new(0);
        for n in 0..3 {
            batch.add_keysign_info(n, &KeysignInfo::new(100 + n, digest(n)));
        }
        h.signer.remove_keysign_info(1);
        let sigs: Vec<_> = (0..3).map(|n| Signature65([n as u8 + 1; 65])).collect();
        h.signer.add_batch_signatures(&batch, &sigs);

        assert_eq!(h.signer.pending_digests(), 2);
        assert_eq!(h.signer.get_signature_or_add_digest(1, 101, digest(1)), Some(sigs[1]));
        assert_eq!(h.signer.get_signature_or_add_digest(2, 102, digest(2)), Some(sigs[2]));
    }

    #[test]
    fn remove_keysign_info_prunes_below_threshold() {
        let h = harness();
        add_digests(&h.signer, 0..10);
        assert_eq!(h.signer.remove_keysign_info(5), 5);
        assert_eq!(h.signer.pending_digests(), 5);
        for n in 0..5 {
            // re-registering a pruned nonce starts fresh
            assert_eq!(h.signer.get_signature_or_add_digest(n, 100 + n, digest(n)), None);
        }
        assert_eq!(h.signer.remove_keysign_info(0), 0);
    }
}
