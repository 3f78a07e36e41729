//! Bodies of the periodic keysign and backlog tasks.

use xchain_signer::{check_block_event, is_time_to_keysign, nonce_to_batch_number, BatchStatus};
use tokio::sync::oneshot;
use xchain_observer::MonitorOutcome;
use xchain_types::{BlockEvent, InboundTracker, MonitorError};

use crate::{ChainClient, ClientError};

/// What one keysign tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeysignTick {
    /// The block event was older than the ledger tip.
    Stale { ledger_height: u64 },
    /// Not a keysign height, or nothing to sign.
    NotScheduled,
    /// Walked the batches starting at the next TSS nonce.
    Completed { signed: usize, skipped: usize },
}

impl ChainClient {
    /// Keysign task body, run on every ledger block event.
    ///
    /// Starting at the batch holding `next_tss_nonce`, signs each unsigned
    /// batch and moves on to the following one only once the current batch
    /// reaches the end of its window. Already signed batches are skipped.
    pub async fn keysign_tick(
        &self,
        event: &BlockEvent,
        next_tss_nonce: u64,
    ) -> Result<KeysignTick, ClientError> {
        let chain_id = self.chain().chain_id;
        let (ledger_height, stale) = check_block_event(
            self.ledger.as_ref(),
            self.clock.as_ref(),
            event,
            self.keysign_delay,
        )
        .await?;
        if stale {
            return Ok(KeysignTick::Stale { ledger_height });
        }

        let pending = self.ledger.get_pending_nonces(chain_id).await?;
        let pruned = self
            .signer
            .remove_keysign_info(u64::try_from(pending.nonce_low).unwrap_or(0));
        if pruned > 0 {
            tracing::debug!(chain = %chain_id, pruned, nonce_low = pending.nonce_low, "pruned keysign info");
        }

        let interval = self.observer.chain_params().outbound_schedule_interval;
        if !is_time_to_keysign(pending, next_tss_nonce, ledger_height, interval) {
            return Ok(KeysignTick::NotScheduled);
        }

        let mut batch_number = nonce_to_batch_number(next_tss_nonce);
        let (mut signed, mut skipped) = (0, 0);
        loop {
            let batch = match self.signer.keysign_batch_status(batch_number).await {
                BatchStatus::NotReady => break,
                BatchStatus::Signed(batch) => {
                    skipped += 1;
                    batch
                }
                BatchStatus::Unsigned(batch) => {
                    if let Err(e) = self.signer.sign_batch(&batch, ledger_height).await {
                        self.metrics.keysign_failures.inc();
                        tracing::error!(chain = %chain_id, batch_num = batch_number, error = %e, "break keysign batch");
                        return Err(e.into());
                    }
                    self.metrics.keysign_batches_signed.inc();
                    signed += 1;
                    batch
                }
            };
            // Never leave a batch partially signed while signing the next.
            if !batch.is_end() {
                break;
            }
            batch_number += 1;
        }

        Ok(KeysignTick::Completed { signed, skipped })
    }

    /// Backlog task body: the ledger's trackers plus unresolved backlog
    /// trackers, for the inbound scanner to re-observe.
    pub async fn backlog_tick(&self) -> Result<Vec<InboundTracker>, ClientError> {
        let trackers = self.backlog.get_trackers_with_backlog().await?;
        self.metrics
            .set_inbound_backlog_size(self.chain(), self.backlog.len());
        Ok(trackers)
    }

    /// Wait for a vote monitor's report; a failure lands in the backlog and
    /// the backlog gauge is refreshed right away.
    pub async fn handle_monitoring_error(
        &self,
        errors: oneshot::Receiver<MonitorError>,
        label: &str,
    ) -> MonitorOutcome {
        let outcome = self.backlog.handle_monitoring_error(errors, label).await;
        if matches!(outcome, MonitorOutcome::Failed { .. }) {
            self.metrics
                .set_inbound_backlog_size(self.chain(), self.backlog.len());
        }
        outcome
    }
}
